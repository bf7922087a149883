use thiserror::Error;

use crate::config::ConfigError;

/// Every way building, generating, executing or hydrating a query can fail.
///
/// Validation errors surface on the offending builder call. Platform
/// selection, execution and hydration errors surface from `execute`.
#[derive(Debug, Error)]
pub enum AggregatedError {
    /// Empty names, bad operator or direction, negative paging, empty IN-list,
    /// unsafe identifiers
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The metadata oracle does not map this entity type
    #[error("Entity \"{0}\" is not a mapped entity")]
    UnknownEntity(String),

    /// The entity has no association with this name
    #[error("Relation \"{relation}\" not found on entity \"{entity}\"")]
    UnknownRelation { entity: String, relation: String },

    /// Neither a field, a column nor a join column matches
    #[error("Column \"{column}\" not found on entity \"{entity}\"")]
    UnknownColumn { entity: String, column: String },

    /// Many-to-many, or the wrong kind for the requested load method
    #[error("Relation \"{relation}\" on \"{entity}\" is not supported: {reason}")]
    UnsupportedRelationKind {
        entity: String,
        relation: String,
        reason: String,
    },

    /// Join columns could not be determined from either side of the association
    #[error("Unable to resolve join columns for \"{relation}\" on \"{entity}\": {reason}")]
    UnresolvableJoin {
        entity: String,
        relation: String,
        reason: String,
    },

    /// NULL compared with an operator other than `=`, `!=` or `<>`
    #[error("Operator \"{operator}\" does not support a NULL value (column \"{column}\")")]
    UnsupportedNullComparison { column: String, operator: String },

    /// Relation and count entries exceed the configured maximum
    #[error("Too many relations requested ({requested}). Max allowed is {max}")]
    TooManyRelations { requested: usize, max: u32 },

    /// The builder is disabled by configuration
    #[error("Aggregated queries are disabled by configuration")]
    Disabled,

    /// No entity type bound yet
    #[error("Call from(entity) before building the query")]
    NotReady,

    /// No generator registered for the active platform
    #[error("Database platform \"{platform}\" is not supported. Supported: {}", .supported.join(", "))]
    UnsupportedPlatform {
        platform: String,
        supported: Vec<String>,
    },

    /// Malformed JSON, shape mismatch, missing projection argument or a
    /// non-scalar raw value
    #[error("Hydration error: {0}")]
    Hydration(String),

    /// Failure reported by the execution collaborator
    #[error("Execution error: {0}")]
    Execution(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Fieldless mirror of [`AggregatedError`] for matching on the kind alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidConfiguration,
    UnknownEntity,
    UnknownRelation,
    UnknownColumn,
    UnsupportedRelationKind,
    UnresolvableJoin,
    UnsupportedNullComparison,
    TooManyRelations,
    Disabled,
    NotReady,
    UnsupportedPlatform,
    Hydration,
    Execution,
    Config,
}

impl AggregatedError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn hydration(message: impl Into<String>) -> Self {
        Self::Hydration(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::UnknownEntity(_) => ErrorKind::UnknownEntity,
            Self::UnknownRelation { .. } => ErrorKind::UnknownRelation,
            Self::UnknownColumn { .. } => ErrorKind::UnknownColumn,
            Self::UnsupportedRelationKind { .. } => ErrorKind::UnsupportedRelationKind,
            Self::UnresolvableJoin { .. } => ErrorKind::UnresolvableJoin,
            Self::UnsupportedNullComparison { .. } => ErrorKind::UnsupportedNullComparison,
            Self::TooManyRelations { .. } => ErrorKind::TooManyRelations,
            Self::Disabled => ErrorKind::Disabled,
            Self::NotReady => ErrorKind::NotReady,
            Self::UnsupportedPlatform { .. } => ErrorKind::UnsupportedPlatform,
            Self::Hydration(_) => ErrorKind::Hydration,
            Self::Execution(_) => ErrorKind::Execution,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type for aggregated query operations
pub type Result<T> = std::result::Result<T, AggregatedError>;
