//! Domain errors for the geoembed system.
//!
//! Each failure class of the embedding pipeline has its own type so callers can
//! match on what went wrong; [`DomainError`] wraps them for the facade.

use thiserror::Error;

use crate::domain::models::Capability;

/// The text encoder could not turn text into a vector.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Text too long: {length} {unit}, max {max_length}")]
    TextTooLong {
        length: usize,
        max_length: usize,
        unit: &'static str,
    },

    #[error("Embedding model failed: {0}")]
    Model(String),

    #[error("Encoder produced {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Phase of a capability attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityPhase {
    /// Making the capability available to the engine.
    Install,
    /// Turning an installed capability on.
    Activate,
}

impl std::fmt::Display for CapabilityPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Activate => write!(f, "activate"),
        }
    }
}

/// A single install or activate step failed.
#[derive(Debug, Error)]
#[error("Failed to {phase} {capability}: {reason}")]
pub struct CapabilityError {
    pub capability: Capability,
    pub phase: CapabilityPhase,
    pub reason: String,
}

impl CapabilityError {
    pub fn new(capability: Capability, phase: CapabilityPhase, reason: impl Into<String>) -> Self {
        Self {
            capability,
            phase,
            reason: reason.into(),
        }
    }
}

/// Fatal startup failure of the embedding store.
#[derive(Debug, Error)]
pub enum StorageInitializationError {
    #[error("Required capability unavailable after retry: {0}")]
    RequiredCapability(#[source] CapabilityError),

    #[error("Failed to open database: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Failed to create schema during '{step}': {source}")]
    Schema {
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database was created with the {existing} schema but this host negotiated {negotiated}")]
    SchemaMismatch { existing: String, negotiated: String },

    #[error("Invalid storage configuration: {0}")]
    Configuration(String),
}

/// Malformed geometry supplied on insert.
#[derive(Debug, Error)]
#[error("Invalid GeoJSON geometry: {reason}")]
pub struct GeometryParseError {
    pub reason: String,
}

impl GeometryParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A statement failed while the store was running.
#[derive(Debug, Error)]
pub enum StorageOperationError {
    #[error("Storage operation '{operation}' failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Storage operation '{operation}' violates a store constraint: {reason}")]
    Constraint {
        operation: &'static str,
        reason: String,
    },

    #[error("Storage operation '{operation}' returned undecodable data: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },
}

impl StorageOperationError {
    pub fn query(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Query { operation, source }
    }

    pub fn constraint(operation: &'static str, reason: impl ToString) -> Self {
        Self::Constraint {
            operation,
            reason: reason.to_string(),
        }
    }

    pub fn decode(operation: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            operation,
            reason: reason.to_string(),
        }
    }
}

/// Two vectors of different lengths were compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Dimension mismatch: expected {expected}, got {actual}")]
pub struct DimensionMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// The coordinates could not be mapped to a spatial cell.
#[derive(Debug, Error)]
pub enum CellIndexError {
    #[error("Invalid coordinates lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Invalid cell resolution: {0}")]
    InvalidResolution(u8),
}

/// A context template could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Unknown template field '{0}'")]
    UnknownField(String),

    #[error("Cannot index '{field}' with [{index}]")]
    BadIndex { field: String, index: String },

    #[error("Unbalanced brace at offset {0}")]
    UnbalancedBrace(usize),

    #[error("Positional placeholders are not supported")]
    Positional,

    #[error("Unsupported conversion or format spec in '{{{0}}}'")]
    UnsupportedSpec(String),

    #[error("Template rendered to empty text")]
    Empty,
}

/// Domain-level errors surfaced by the geoembed facade.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    StorageInitialization(#[from] StorageInitializationError),

    #[error(transparent)]
    GeometryParse(#[from] GeometryParseError),

    #[error(transparent)]
    StorageOperation(#[from] StorageOperationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
