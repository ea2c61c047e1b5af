use crate::editor::ZoomConfig;
use crate::error::PayloadError;
use crate::graph::{GraphConverter, LayoutConfig};
use serde::{Deserialize, Serialize};
use std::fs;

/// Tunables for an editor session. Every field is optional in the JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub layout: LayoutConfig,
    pub zoom: ZoomConfig,
    /// Reject dangling links on load instead of dropping them.
    pub strict_links: bool,
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, PayloadError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, PayloadError> {
        let json = fs::read_to_string(path).map_err(|e| PayloadError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn converter(&self) -> GraphConverter {
        GraphConverter::builder().strict(self.strict_links).build()
    }

    fn check(&self) -> Result<(), PayloadError> {
        let zoom = &self.zoom;
        if !(zoom.min > 0.0 && zoom.min <= zoom.max) {
            return Err(PayloadError::InvalidConfig(format!(
                "zoom bounds must satisfy 0 < min <= max, got {}..{}",
                zoom.min, zoom.max
            )));
        }
        if zoom.step <= 0.0 {
            return Err(PayloadError::InvalidConfig(format!(
                "zoom step must be positive, got {}",
                zoom.step
            )));
        }
        if self.layout.col_width <= 0.0 || self.layout.row_height <= 0.0 {
            return Err(PayloadError::InvalidConfig(
                "layout spacing must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
