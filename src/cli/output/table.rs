//! Table output formatting for CLI commands
//!
//! Search hits and store statistics rendered with comfy-table.

use std::env;

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use super::truncate;
use crate::domain::models::{ModelInfo, SearchHit, StoreStats};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format ranked search hits, best first.
    pub fn format_hits(&self, hits: &[SearchHit]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("#").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Similarity").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
            Cell::new("Geometry").add_attribute(Attribute::Bold),
            Cell::new("ID").add_attribute(Attribute::Bold),
        ]);

        for (rank, hit) in hits.iter().enumerate() {
            let similarity = format!("{:.4}", hit.similarity);
            let similarity_cell = if self.use_colors {
                Cell::new(similarity).fg(similarity_color(hit.similarity))
            } else {
                Cell::new(similarity)
            };

            let id = hit.id.to_string();
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(truncate(&hit.name, 40)),
                similarity_cell,
                Cell::new(&hit.source_type),
                Cell::new(hit.geometry.as_deref().map_or_else(|| "-".to_string(), |g| truncate(g, 48))),
                Cell::new(&id[..8]),
            ]);
        }

        table.to_string()
    }

    /// Format store statistics alongside the active encoder.
    pub fn format_stats(&self, stats: &StoreStats, model: &ModelInfo) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        let spatial = if stats.spatial_enabled { "enabled" } else { "fallback (GeoJSON text)" };
        let spatial_cell = if self.use_colors {
            Cell::new(spatial).fg(if stats.spatial_enabled { Color::Green } else { Color::Yellow })
        } else {
            Cell::new(spatial)
        };

        table.add_row(vec![Cell::new("Embeddings"), Cell::new(stats.total_embeddings)]);
        table.add_row(vec![Cell::new("Source types"), Cell::new(stats.source_types)]);
        table.add_row(vec![Cell::new("Models"), Cell::new(stats.models)]);
        table.add_row(vec![Cell::new("Spatial index"), spatial_cell]);
        table.add_row(vec![Cell::new("Encoder"), Cell::new(&model.model)]);
        table.add_row(vec![Cell::new("Dimension"), Cell::new(model.embedding_dim)]);

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

fn similarity_color(similarity: f32) -> Color {
    if similarity >= 0.75 {
        Color::Green
    } else if similarity >= 0.4 {
        Color::Yellow
    } else {
        Color::DarkGrey
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Map;
    use uuid::Uuid;

    fn hit(name: &str, similarity: f32) -> SearchHit {
        SearchHit {
            id: Uuid::new_v4(),
            name: name.to_string(),
            source_type: "vector".to_string(),
            properties: Map::new(),
            geometry: Some(r#"{"type":"Point","coordinates":[-74.006,40.7128]}"#.to_string()),
            similarity,
            embedding_model: "geoembed-hashing-v1-d384".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_hits_table_lists_rank_and_similarity() {
        let formatter = TableFormatter::with_config(false, Some(160));
        let rendered = formatter.format_hits(&[hit("Test City", 0.9731), hit("Harbor", 0.41)]);

        assert!(rendered.contains("Test City"));
        assert!(rendered.contains("0.9731"));
        assert!(rendered.contains("0.4100"));
        assert!(rendered.contains("Similarity"));
    }

    #[test]
    fn test_stats_table_reports_fallback() {
        let formatter = TableFormatter::with_config(false, Some(120));
        let stats = StoreStats {
            total_embeddings: 3,
            source_types: 1,
            models: 1,
            spatial_enabled: false,
        };
        let model = ModelInfo {
            model: "geoembed-hashing-v1-d384".to_string(),
            embedding_dim: 384,
        };
        let rendered = formatter.format_stats(&stats, &model);

        assert!(rendered.contains("fallback"));
        assert!(rendered.contains("384"));
    }
}
