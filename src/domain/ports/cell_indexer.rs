use crate::domain::errors::CellIndexError;

/// Maps a coordinate to a hierarchical hexagonal cell.
pub trait SpatialCellIndexer: Send + Sync {
    /// Identifier of the cell containing `(lat, lon)` at `resolution`.
    fn cell_id(&self, lat: f64, lon: f64, resolution: u8) -> Result<String, CellIndexError>;
}
