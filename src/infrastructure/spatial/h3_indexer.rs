//! H3 cell discretization backed by `h3o`.

use h3o::{LatLng, Resolution};

use crate::domain::errors::CellIndexError;
use crate::domain::ports::SpatialCellIndexer;

#[derive(Debug, Clone, Copy, Default)]
pub struct H3CellIndexer;

impl H3CellIndexer {
    pub const fn new() -> Self {
        Self
    }
}

impl SpatialCellIndexer for H3CellIndexer {
    fn cell_id(&self, lat: f64, lon: f64, resolution: u8) -> Result<String, CellIndexError> {
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
        if !in_range {
            return Err(CellIndexError::InvalidCoordinates { lat, lon });
        }

        let resolution = Resolution::try_from(resolution)
            .map_err(|_| CellIndexError::InvalidResolution(resolution))?;
        let coord =
            LatLng::new(lat, lon).map_err(|_| CellIndexError::InvalidCoordinates { lat, lon })?;

        Ok(coord.to_cell(resolution).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h3o::CellIndex;
    use std::str::FromStr;

    #[test]
    fn test_cell_at_resolution() {
        let id = H3CellIndexer::new().cell_id(40.7128, -74.006, 9).unwrap();
        let cell = CellIndex::from_str(&id).unwrap();
        assert_eq!(cell.resolution(), Resolution::Nine);
        assert_eq!(id.len(), 15);
    }

    #[test]
    fn test_deterministic_and_resolution_sensitive() {
        let indexer = H3CellIndexer::new();
        let a = indexer.cell_id(48.8566, 2.3522, 9).unwrap();
        let b = indexer.cell_id(48.8566, 2.3522, 9).unwrap();
        let coarse = indexer.cell_id(48.8566, 2.3522, 5).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, coarse);
    }

    #[test]
    fn test_rejects_bad_input() {
        let indexer = H3CellIndexer::new();
        assert!(matches!(
            indexer.cell_id(91.0, 0.0, 9),
            Err(CellIndexError::InvalidCoordinates { .. })
        ));
        assert!(matches!(
            indexer.cell_id(f64::NAN, 0.0, 9),
            Err(CellIndexError::InvalidCoordinates { .. })
        ));
        assert!(matches!(
            indexer.cell_id(0.0, 0.0, 16),
            Err(CellIndexError::InvalidResolution(16))
        ));
    }
}
