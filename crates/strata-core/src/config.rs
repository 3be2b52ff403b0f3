//! Configuration system
//!
//! TOML configuration for the arrangement engine. Every section carries
//! `#[serde(default)]` so a partial file only overrides what it names.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::layout::dock::{DockOrient, DockPosition};
use crate::layout::place::Placement;
use crate::layout::Layout;
use crate::view::StrutMode;

/// Largest number of views a screen may carry (one bit per view in a tag mask).
pub const MAX_VIEWS: usize = 64;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Default view parameters
    pub layout: LayoutConfig,

    /// Frame decoration sizes
    pub decoration: DecorationConfig,

    /// Dock-app area
    pub dock: DockConfig,

    /// Per-view overrides
    #[serde(default)]
    pub views: Vec<ViewConfigEntry>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(Self::find_config_file);

        match config_path {
            Some(path) if path.exists() => {
                info!("Loading configuration from {:?}", path);
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {path:?}"))?;

                let config: Self = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {path:?}"))?;

                config
                    .validate()
                    .with_context(|| format!("Invalid config file: {path:?}"))?;
                Ok(config)
            }
            Some(path) => {
                warn!("Config file not found at {:?}, using defaults", path);
                Ok(Self::default())
            }
            None => {
                info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Find the configuration file
    fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            dirs::config_dir().map(|p| p.join("strata/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/strata/config.toml")),
            Some(PathBuf::from("/etc/strata/config.toml")),
        ];

        candidates.into_iter().flatten().find(|p| p.exists())
    }

    /// Generate default configuration as a string
    pub fn default_config_string() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::from("# Error generating config"))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.general.views == 0 || self.general.views > MAX_VIEWS {
            bail!("general.views must be between 1 and {MAX_VIEWS}, got {}", self.general.views);
        }
        if !(0.0..=1.0).contains(&self.layout.mwfact) {
            bail!("layout.mwfact must be within 0.0..=1.0, got {}", self.layout.mwfact);
        }
        if self.decoration.border_width < 0
            || self.decoration.title_height < 0
            || self.decoration.grip_height < 0
        {
            bail!("decoration sizes must not be negative");
        }
        if self.dock.cell_size <= 0 {
            bail!("dock.cell_size must be positive, got {}", self.dock.cell_size);
        }
        for entry in &self.views {
            if entry.index >= self.general.views {
                bail!("views entry {} is out of range", entry.index);
            }
            if let Some(mwfact) = entry.mwfact {
                if !(0.0..=1.0).contains(&mwfact) {
                    bail!("views entry {} has mwfact {mwfact} outside 0.0..=1.0", entry.index);
                }
            }
        }
        Ok(())
    }

    /// Layout parameters for one view, overrides applied.
    pub fn view_layout(&self, index: usize) -> LayoutConfig {
        let mut layout = self.layout.clone();
        if let Some(entry) = self.views.iter().find(|e| e.index == index) {
            if let Some(l) = entry.layout {
                layout.default_layout = l;
            }
            if let Some(m) = entry.mwfact {
                layout.mwfact = m;
            }
            if let Some(n) = entry.nmaster {
                layout.nmaster = n;
            }
            if let Some(n) = entry.ncolumns {
                layout.ncolumns = n;
            }
            if let Some(p) = entry.placement {
                layout.placement = p;
            }
        }
        layout
    }
}

/// General settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Number of views (tags) per screen
    pub views: usize,
    /// Pointer travel (Manhattan, pixels) before a press becomes a drag
    pub drag_distance: i32,
    /// Distance at which dragged edges snap
    pub snap_distance: i32,
    /// Dragging a tiled window over another swaps them instead of tearing out
    pub shuffle_by_drag: bool,
    /// Give input focus to newly managed clients
    pub focus_new: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            views: 8,
            drag_distance: 5,
            snap_distance: 10,
            shuffle_by_drag: true,
            focus_new: true,
        }
    }
}

/// Default parameters of every view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub default_layout: Layout,
    /// Master area fraction of the major extent
    pub mwfact: f64,
    pub nmaster: usize,
    pub ncolumns: usize,
    /// Placement of new floating windows without a user position
    pub placement: Placement,
    pub struts: StrutMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_layout: Layout::TileRight,
            mwfact: 0.6,
            nmaster: 1,
            ncolumns: 2,
            placement: Placement::MinOverlap,
            struts: StrutMode::On,
        }
    }
}

/// Frame decoration sizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    pub border_width: i32,
    pub title_height: i32,
    pub grip_height: i32,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            border_width: 1,
            title_height: 18,
            grip_height: 0,
        }
    }
}

/// Dock-app area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockConfig {
    pub position: DockPosition,
    pub orient: DockOrient,
    /// Monitor index hosting the dock
    pub monitor: usize,
    /// Edge length of one dock-app cell
    pub cell_size: i32,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            position: DockPosition::East,
            orient: DockOrient::Vertical,
            monitor: 0,
            cell_size: 64,
        }
    }
}

/// Per-view overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewConfigEntry {
    pub index: usize,
    pub layout: Option<Layout>,
    pub mwfact: Option<f64>,
    pub nmaster: Option<usize>,
    pub ncolumns: Option<usize>,
    pub placement: Option<Placement>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.views, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config() {
        let parsed: Config = toml::from_str(
            r#"
            [layout]
            default_layout = "grid"
            mwfact = 0.5

            [[views]]
            index = 2
            layout = "monocle"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.layout.default_layout, Layout::Grid);
        assert_eq!(parsed.general, GeneralConfig::default());
        assert_eq!(parsed.view_layout(2).default_layout, Layout::Monocle);
        assert_eq!(parsed.view_layout(2).mwfact, 0.5);
        assert_eq!(parsed.view_layout(1).default_layout, Layout::Grid);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.general.views = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.layout.mwfact = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\ndrag_distance = 9\n").unwrap();
        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.general.drag_distance, 9);

        std::fs::write(&path, "[general]\nviews = 0\n").unwrap();
        assert!(Config::load(path.to_str()).is_err());
    }
}
