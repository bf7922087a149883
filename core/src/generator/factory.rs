use std::collections::BTreeMap;
use std::sync::Arc;

use aggregated_types::{Dialect, platform_key};

use super::SqlGenerator;
use crate::error::{AggregatedError, Result};

/// Platform key -> generator registry.
///
/// Hosts register generators at startup; lookups normalize the platform name
/// through [`platform_key`] so `mariadb` finds the `mysql` generator.
#[derive(Clone, Default)]
pub struct GeneratorFactory {
    generators: BTreeMap<String, Arc<dyn SqlGenerator>>,
}

impl core::fmt::Debug for GeneratorFactory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GeneratorFactory")
            .field("platforms", &self.platforms())
            .finish()
    }
}

impl GeneratorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `generator` under the normalized `platform` key, replacing
    /// any previous registration.
    pub fn register(&mut self, platform: &str, generator: Arc<dyn SqlGenerator>) -> Result<()> {
        let key = platform.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(AggregatedError::invalid("Generator platform key cannot be empty"));
        }
        self.generators.insert(key, generator);
        Ok(())
    }

    /// Registers `generator` under the canonical key of `dialect`.
    pub fn register_dialect(&mut self, dialect: Dialect, generator: Arc<dyn SqlGenerator>) {
        self.generators.insert(dialect.as_str().to_string(), generator);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, platform: &str, generator: impl SqlGenerator + 'static) -> Result<Self> {
        self.register(platform, Arc::new(generator))?;
        Ok(self)
    }

    /// Generator for the platform the active connection reports.
    pub fn create(&self, platform: &str) -> Result<Arc<dyn SqlGenerator>> {
        let key = platform_key(platform);
        match self.generators.get(&key) {
            Some(generator) => Ok(Arc::clone(generator)),
            None => {
                crate::aggregated_trace_unsupported!(key);
                Err(AggregatedError::UnsupportedPlatform {
                    platform: key,
                    supported: self.platforms(),
                })
            }
        }
    }

    /// Registered keys in sorted order.
    pub fn platforms(&self) -> Vec<String> {
        self.generators.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}
