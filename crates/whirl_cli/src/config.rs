//! Whirl configuration file handling
//!
//! `whirl.toml` describes a photo wall: the viewport, the photo sizes shared by
//! every row, one scroll controller per row, frame pacing, and fling tuning.
//! Every section is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use whirl_core::{Axis, Rect, Size};
use whirl_layout::{ControllerConfig, DragConfig};
use whirl_platform::PacingConfig;

/// Configuration file name looked up by `load_from_dir`
pub const CONFIG_FILE: &str = "whirl.toml";

/// Top-level configuration stored in whirl.toml
#[derive(Debug, Deserialize, Serialize)]
pub struct WhirlConfig {
    #[serde(default)]
    pub wall: WallConfig,
    /// One entry per carousel row
    #[serde(default = "default_rows")]
    pub rows: Vec<ControllerConfig>,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub drag: DragConfig,
}

/// Photo wall geometry
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct WallConfig {
    /// Scroll axis of every row
    pub axis: Axis,
    /// Visible extent along the scroll axis
    pub viewport: f32,
    /// Row thickness across the scroll axis
    pub row_extent: f32,
    /// Photo extents along the scroll axis
    pub photos: Vec<f32>,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            axis: Axis::Horizontal,
            viewport: 390.0,
            row_extent: 120.0,
            photos: default_photos(),
        }
    }
}

impl WallConfig {
    /// Photo sizes for the configured axis
    pub fn items(&self) -> Vec<Size> {
        self.photos
            .iter()
            .map(|&extent| self.axis.size(extent, self.row_extent))
            .collect()
    }

    /// Bounds of one row
    pub fn bounds(&self) -> Rect {
        self.axis.size(self.viewport, self.row_extent).to_rect()
    }

    /// Summed photo extent along the scroll axis
    pub fn content_extent(&self) -> f32 {
        self.photos.iter().sum()
    }
}

fn default_photos() -> Vec<f32> {
    vec![
        160.0, 90.0, 120.0, 200.0, 140.0, 100.0, 180.0, 120.0, 90.0, 160.0, 130.0, 110.0, 170.0,
        100.0, 150.0,
    ]
}

/// Three rows scrolling in alternating directions, staggered apart
fn default_rows() -> Vec<ControllerConfig> {
    vec![
        ControllerConfig::default()
            .with_delta(-0.2)
            .with_initial_offset(-600.0),
        ControllerConfig::default().with_delta(0.2),
        ControllerConfig::default()
            .with_delta(-0.2)
            .with_initial_offset(600.0),
    ]
}

impl Default for WhirlConfig {
    fn default() -> Self {
        Self {
            wall: WallConfig::default(),
            rows: default_rows(),
            pacing: PacingConfig::default(),
            drag: DragConfig::default(),
        }
    }
}

impl WhirlConfig {
    /// Load whirl.toml from a directory, using defaults when it is absent
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(CONFIG_FILE);
        if !config_path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE, path.display());
            return Ok(Self::default());
        }
        Self::load(&config_path)
    }

    /// Load a specific configuration file
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: WhirlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
        Ok(config)
    }

    /// Check values the layout cannot work with
    pub fn validate(&self) -> Result<()> {
        let wall = &self.wall;
        if !(wall.viewport.is_finite() && wall.viewport > 0.0) {
            anyhow::bail!("wall.viewport must be a positive number, got {}", wall.viewport);
        }
        if let Some(bad) = wall.photos.iter().find(|e| !(e.is_finite() && **e >= 0.0)) {
            anyhow::bail!("wall.photos entries must be non-negative, got {}", bad);
        }
        if wall.content_extent() < wall.viewport {
            tracing::warn!(
                content = wall.content_extent(),
                viewport = wall.viewport,
                "Photos are shorter than the viewport; rows will show gaps"
            );
        }
        if self.rows.is_empty() {
            anyhow::bail!("at least one [[rows]] entry is required");
        }
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Write a default whirl.toml into `path`
    pub fn write_default(path: &Path) -> Result<()> {
        let config_path = path.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }
        let content = Self::default().to_toml()?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: WhirlConfig = toml::from_str("").unwrap();
        assert_eq!(config.rows.len(), 3);
        assert_eq!(config.wall.axis, Axis::Horizontal);
        assert_eq!(config.pacing.refresh_rate, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_rows_and_wall() {
        let config: WhirlConfig = toml::from_str(
            r#"
            [wall]
            axis = "vertical"
            viewport = 300.0
            photos = [100.0, 100.0, 100.0, 100.0]

            [[rows]]
            delta = 0.5

            [[rows]]
            delta = -0.5
            initial_offset = 50.0

            [pacing]
            refresh_rate = 60

            [drag]
            settle_multiplier = 2.0
            "#,
        )
        .unwrap();

        assert_eq!(config.wall.axis, Axis::Vertical);
        assert_eq!(config.wall.items()[0], Size::new(120.0, 100.0));
        assert_eq!(config.wall.bounds(), Rect::new(0.0, 0.0, 120.0, 300.0));
        assert_eq!(config.rows.len(), 2);
        assert_eq!(config.rows[1].initial_offset, 50.0);
        assert_eq!(config.pacing.refresh_rate, 60);
        assert_eq!(config.drag.settle_multiplier, 2.0);
    }

    #[test]
    fn test_validate_rejects_bad_viewport() {
        let mut config = WhirlConfig::default();
        config.wall.viewport = 0.0;
        assert!(config.validate().is_err());

        let mut config = WhirlConfig::default();
        config.rows.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let text = WhirlConfig::default().to_toml().unwrap();
        let parsed: WhirlConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.wall.photos, default_photos());
    }
}
