//! Engine configuration
//!
//! Loaded from a JSON file or assembled with [`EngineConfigBuilder`]. Every
//! field has a default, so `{}` is a valid configuration.

use crate::table::TableLimits;
use crate::{Result, TemplateError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// About an A0 page at 300 dpi
pub const DEFAULT_MAX_RASTER_PIXELS: u64 = 140_000_000;

/// A TrueType file registered under a family name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSource {
    pub family: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Interactive surface resolution
    pub dpi: f64,
    /// Interactive surface zoom factor
    pub zoom: f64,
    /// Sampling resolution of PNG export
    pub raster_dpi: f64,
    /// Largest PNG page, in pixels
    pub max_raster_pixels: u64,
    /// Base directory for relative image and font paths
    pub resource_root: Option<PathBuf>,
    pub fonts: Vec<FontSource>,
    pub default_font_family: Option<String>,
    pub table_limits: TableLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dpi: 96.0,
            zoom: 1.0,
            raster_dpi: 150.0,
            max_raster_pixels: DEFAULT_MAX_RASTER_PIXELS,
            resource_root: None,
            fonts: Vec::new(),
            default_font_family: None,
            table_limits: TableLimits::default(),
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TemplateError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Load a JSON config file
    ///
    /// A missing `resourceRoot` defaults to the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TemplateError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&json)?;
        if config.resource_root.is_none() {
            config.resource_root = path.parent().map(Path::to_path_buf);
        }
        log::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        for (name, value) in [
            ("dpi", self.dpi),
            ("zoom", self.zoom),
            ("rasterDpi", self.raster_dpi),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TemplateError::Config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.max_raster_pixels == 0 {
            return Err(TemplateError::Config("maxRasterPixels must be at least 1".into()));
        }
        if self.table_limits.max_rows == 0 || self.table_limits.max_columns == 0 {
            return Err(TemplateError::Config("table limits must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn dpi(mut self, dpi: f64) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn zoom(mut self, zoom: f64) -> Self {
        self.config.zoom = zoom;
        self
    }

    pub fn raster_dpi(mut self, dpi: f64) -> Self {
        self.config.raster_dpi = dpi;
        self
    }

    pub fn max_raster_pixels(mut self, pixels: u64) -> Self {
        self.config.max_raster_pixels = pixels;
        self
    }

    pub fn resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.resource_root = Some(root.into());
        self
    }

    pub fn font(mut self, family: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.config.fonts.push(FontSource {
            family: family.into(),
            path: path.into(),
        });
        self
    }

    pub fn default_font_family(mut self, family: impl Into<String>) -> Self {
        self.config.default_font_family = Some(family.into());
        self
    }

    pub fn table_limits(mut self, max_rows: usize, max_columns: usize) -> Self {
        self.config.table_limits = TableLimits {
            max_rows,
            max_columns,
        };
        self
    }

    pub fn build(self) -> Result<EngineConfig> {
        self.config.check()?;
        Ok(self.config)
    }
}
