/// JSON configuration for both tools
use crate::segmentation::colormap::Colormap;
use crate::selection::nearest::NearestPointRoi;
use constants::segmentation::{AUTOSEG_COMPONENT_NAME, DEFAULT_AXES, DEFAULT_METHOD};
use constants::selection::{DENSITY_MATCH_THRESHOLD, POINT_PICK_RADIUS, PROJECTION_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Auto-segmentation run settings. Missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Registered method name.
    pub method: String,
    /// Committed parameter values; coerced against the method's specs.
    pub params: Map<String, Value>,
    pub component_name: String,
    pub colormap: Colormap,
    pub reversed: bool,
    /// Attributes stacked into the clustering matrix, in column order.
    pub axes: Vec<String>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            params: Map::new(),
            component_name: AUTOSEG_COMPONENT_NAME.to_string(),
            colormap: Colormap::default(),
            reversed: false,
            axes: DEFAULT_AXES.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl SegmentationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Interactive selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Rows projected per chunk.
    pub chunk_size: usize,
    /// Screen radius of the single point pick.
    pub pick_radius: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            chunk_size: PROJECTION_CHUNK_SIZE,
            pick_radius: POINT_PICK_RADIUS,
        }
    }
}

impl SelectionConfig {
    /// Density match tolerance of the density pick; fixed.
    pub fn density_threshold(&self) -> f64 {
        DENSITY_MATCH_THRESHOLD
    }

    /// Single point pick at `(x, y)` using the configured radius.
    pub fn point_pick(&self, x: f64, y: f64) -> NearestPointRoi {
        NearestPointRoi::new(x, y).with_radius(self.pick_radius)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_takes_defaults() {
        let config = SegmentationConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SegmentationConfig::default());
        assert_eq!(config.method, "dbscan");
        assert_eq!(config.component_name, "_autoseg_labels");
        assert_eq!(config.colormap, Colormap::Plasma);
        assert_eq!(config.axes, vec!["x", "y", "z"]);
    }

    #[test]
    fn partial_config_overrides() {
        let config = SegmentationConfig::from_json_str(
            r#"{"method": "optics", "params": {"eps": 1.0}, "colormap": "viridis", "reversed": true}"#,
        )
        .unwrap();
        assert_eq!(config.method, "optics");
        assert_eq!(config.params.get("eps"), Some(&json!(1.0)));
        assert_eq!(config.colormap, Colormap::Viridis);
        assert!(config.reversed);
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        assert!(matches!(
            SegmentationConfig::from_json_str(r#"{"colormap": "jet"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SegmentationConfig::load(Path::new("/nonexistent/config.json")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn selection_defaults() {
        let config = SelectionConfig::from_json_str(r#"{"pick_radius": 2.0}"#).unwrap();
        assert_eq!(config.chunk_size, 10_000);
        assert_eq!(config.pick_radius, 2.0);
        assert_eq!(config.density_threshold(), 1e-6);
        assert_eq!(config.point_pick(1.0, 2.0).max_radius, 2.0);
    }
}
