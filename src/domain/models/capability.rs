//! Storage engine capabilities negotiated at startup.

use serde::{Deserialize, Serialize};

/// Whether startup can proceed without a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

/// An engine feature the store depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// JSON text storage and validation (SQLite JSON1).
    StructuredData,
    /// Native geometry storage and spatial indexing (SpatiaLite).
    SpatialIndex,
}

impl Capability {
    pub const fn requirement(self) -> Requirement {
        match self {
            Self::StructuredData => Requirement::Required,
            Self::SpatialIndex => Requirement::Optional,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StructuredData => write!(f, "structured data"),
            Self::SpatialIndex => write!(f, "spatial index"),
        }
    }
}

/// Result of capability negotiation. Computed once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityState {
    pub structured_data: bool,
    pub spatial_enabled: bool,
}

impl CapabilityState {
    pub const fn new(spatial_enabled: bool) -> Self {
        Self {
            structured_data: true,
            spatial_enabled,
        }
    }

    pub const fn schema_kind(&self) -> SchemaKind {
        if self.spatial_enabled {
            SchemaKind::Spatial
        } else {
            SchemaKind::Fallback
        }
    }
}

/// Physical layout of the embeddings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Geometry stored as a native SpatiaLite column with an R*Tree index
    Spatial,
    /// Geometry stored as GeoJSON text
    Fallback,
}

impl SchemaKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spatial => "spatial",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spatial" => Ok(Self::Spatial),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown schema kind '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements() {
        assert_eq!(Capability::StructuredData.requirement(), Requirement::Required);
        assert_eq!(Capability::SpatialIndex.requirement(), Requirement::Optional);
    }

    #[test]
    fn test_state_maps_to_schema_kind() {
        assert_eq!(CapabilityState::new(true).schema_kind(), SchemaKind::Spatial);
        assert_eq!(CapabilityState::new(false).schema_kind(), SchemaKind::Fallback);
        assert!(CapabilityState::new(false).structured_data);
    }

    #[test]
    fn test_schema_kind_parse() {
        assert_eq!("spatial".parse::<SchemaKind>(), Ok(SchemaKind::Spatial));
        assert_eq!("fallback".parse::<SchemaKind>(), Ok(SchemaKind::Fallback));
        assert!("duckdb".parse::<SchemaKind>().is_err());
    }
}
