//! Plotter configuration.
//!
//! Settings are read from `vecplot.toml` (every field optional) and can be
//! overridden from the environment, which takes precedence.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::basics::PointEquality;
use crate::error::Result;

/// Default line width: 1/850 of the default unit-square user space.
pub const DEFAULT_LINE_WIDTH: f64 = 1.0 / 850.0;

/// Default cap on the number of points in an unfilled path.
pub const DEFAULT_MAX_UNFILLED_PATH_LENGTH: usize = 500;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotterConfig {
    /// Line width (user units) of a freshly opened plotter
    pub default_line_width: f64,
    /// Output device geometry
    pub device: DeviceConfig,
    /// Path accumulation settings
    pub paths: PathConfig,
    /// Curve flattening settings
    pub curves: CurveConfig,
}

/// Addressing model of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Integer-addressed (pixels, plotter steps)
    Raster,
    /// Real-valued coordinates (page description formats)
    Real,
}

impl From<DeviceKind> for PointEquality {
    fn from(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Raster => PointEquality::Raster,
            DeviceKind::Real => PointEquality::Real,
        }
    }
}

/// Output device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub kind: DeviceKind,
    /// Device rectangle `[xmin, ymin, xmax, ymax]` the user space maps onto
    pub viewport: [f64; 4],
    /// Device y axis points down
    pub flip_y: bool,
}

/// Path accumulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Unfilled paths reaching this many points are ended automatically
    /// (0 disables the limit)
    pub max_unfilled_path_length: usize,
    /// Defer isolated arcs so they can be drawn natively
    pub defer_arcs: bool,
}

/// Curve flattening configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    /// Bezier flattening tolerance is 0.5 / approximation_scale device units
    pub approximation_scale: f64,
}

impl Default for PlotterConfig {
    fn default() -> Self {
        Self {
            default_line_width: DEFAULT_LINE_WIDTH,
            device: DeviceConfig::default(),
            paths: PathConfig::default(),
            curves: CurveConfig::default(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            kind: DeviceKind::Real,
            viewport: [0.0, 0.0, 1.0, 1.0],
            flip_y: false,
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_unfilled_path_length: DEFAULT_MAX_UNFILLED_PATH_LENGTH,
            defer_arcs: true,
        }
    }
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            approximation_scale: 1.0,
        }
    }
}

impl PlotterConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `vecplot.toml` from the current directory, or the defaults if
    /// it is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file("vecplot.toml").unwrap_or_default()
    }

    /// Apply environment overrides
    ///
    /// - `VECPLOT_MAX_LINE_LENGTH`: unfilled path length cap
    /// - `VECPLOT_DEVICE_KIND`: `raster` or `real`
    /// - `VECPLOT_FLIP_Y`: `1`/`true` to flip the device y axis
    pub fn merge_with_env(&mut self) {
        self.merge_with(|key| std::env::var(key).ok());
    }

    fn merge_with<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = get("VECPLOT_MAX_LINE_LENGTH") {
            match val.trim().parse::<usize>() {
                Ok(n) => self.paths.max_unfilled_path_length = n,
                Err(_) => tracing::warn!("ignoring invalid VECPLOT_MAX_LINE_LENGTH {:?}", val),
            }
        }
        if let Some(val) = get("VECPLOT_DEVICE_KIND") {
            match val.trim().to_ascii_lowercase().as_str() {
                "raster" => self.device.kind = DeviceKind::Raster,
                "real" => self.device.kind = DeviceKind::Real,
                other => tracing::warn!("ignoring unknown VECPLOT_DEVICE_KIND {:?}", other),
            }
        }
        if let Some(val) = get("VECPLOT_FLIP_Y") {
            self.device.flip_y = val == "1" || val.eq_ignore_ascii_case("true");
        }
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }

    /// Point equality policy of the configured device
    pub fn point_equality(&self) -> PointEquality {
        self.device.kind.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PlotterConfig::default();
        assert_eq!(config.paths.max_unfilled_path_length, 500);
        assert!(config.paths.defer_arcs);
        assert_eq!(config.device.kind, DeviceKind::Real);
        assert_eq!(config.point_equality(), PointEquality::Real);
    }

    #[test]
    fn test_toml_serialization() {
        let config = PlotterConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: PlotterConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml() {
        let parsed: PlotterConfig = toml::from_str(
            r#"
            [device]
            kind = "raster"
            viewport = [0.0, 0.0, 640.0, 480.0]
            flip_y = true

            [paths]
            max_unfilled_path_length = 64
            "#,
        )
        .unwrap();
        assert_eq!(parsed.device.kind, DeviceKind::Raster);
        assert!(parsed.device.flip_y);
        assert_eq!(parsed.paths.max_unfilled_path_length, 64);
        assert!(parsed.paths.defer_arcs);
        assert_eq!(parsed.curves.approximation_scale, 1.0);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VECPLOT_MAX_LINE_LENGTH", "12"),
            ("VECPLOT_DEVICE_KIND", "Raster"),
            ("VECPLOT_FLIP_Y", "true"),
        ]
        .into_iter()
        .collect();
        let mut config = PlotterConfig::default();
        config.merge_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.paths.max_unfilled_path_length, 12);
        assert_eq!(config.device.kind, DeviceKind::Raster);
        assert!(config.device.flip_y);
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = PlotterConfig::default();
        config.merge_with(|k| match k {
            "VECPLOT_MAX_LINE_LENGTH" => Some("lots".to_string()),
            "VECPLOT_DEVICE_KIND" => Some("hologram".to_string()),
            _ => None,
        });
        assert_eq!(config.paths.max_unfilled_path_length, 500);
        assert_eq!(config.device.kind, DeviceKind::Real);
    }

    #[test]
    fn test_missing_file() {
        assert!(PlotterConfig::load_from_file("/nonexistent/vecplot.toml").is_err());
    }
}
