use core::marker::PhantomData;

use serde::de::DeserializeOwned;

use super::{ArrayHydrator, Hydrator};
use crate::error::{AggregatedError, Result};
use crate::executor::RawRow;
use crate::metadata::MetadataResolver;
use crate::query::RelationSet;

/// Projection strategy.
///
/// Rows are decoded as by [`ArrayHydrator`] and then deserialized into `T`.
/// Field names match row keys; `#[serde(default)]` supplies defaults; a
/// required field with no matching key fails the batch.
///
/// ```
/// use aggregated_core::hydrator::DtoHydrator;
///
/// #[derive(serde::Deserialize)]
/// struct PartnerView {
///     id: i64,
///     #[serde(default)]
///     promocodes_count: i64,
/// }
///
/// let hydrator = DtoHydrator::<PartnerView>::new();
/// # let _ = hydrator;
/// ```
pub struct DtoHydrator<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> DtoHydrator<T> {
    pub fn new() -> Self {
        Self { _target: PhantomData }
    }
}

impl<T> Default for DtoHydrator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for DtoHydrator<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for DtoHydrator<T> {}

impl<T> core::fmt::Debug for DtoHydrator<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DtoHydrator")
            .field("target", &core::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned> Hydrator for DtoHydrator<T> {
    type Output = T;

    fn name(&self) -> &'static str {
        "dto"
    }

    fn hydrate(
        &self,
        rows: Vec<RawRow>,
        _entity: &str,
        relations: &RelationSet,
        _metadata: &MetadataResolver,
    ) -> Result<Vec<T>> {
        rows.into_iter()
            .map(|row| {
                let row = ArrayHydrator::hydrate_row(row, relations)?;
                serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| {
                    AggregatedError::hydration(format!(
                        "Cannot build {}: {e}",
                        core::any::type_name::<T>()
                    ))
                })
            })
            .collect()
    }
}
