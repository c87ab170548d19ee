use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    geometry::{FitMode, NormalizedOffset, ScreenRect, TrimRange},
};

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Mov,
}

impl OutputFormat {
    /// ffmpeg muxer name
    pub fn ffmpeg_format(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
        }
    }

    /// File extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
        }
    }
}

/// Main configuration for Screenframer
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Output encoding settings
    pub output: OutputConfig,

    /// Video placement settings
    pub placement: PlacementConfig,

    /// Trim settings
    pub trim: TrimConfig,

    /// Manual screen rect override. When set, detection and preset defaults
    /// are ignored.
    pub screen_rect: Option<ScreenRect>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.placement.validate()?;
        self.trim.validate()?;
        Ok(())
    }

    /// Resolve the serializable configuration into the composition value
    /// object threaded through preview and export.
    ///
    /// Screen rect precedence: manual override, then the detected rect, then
    /// the preset/default fallback. Percent knobs become normalized factors
    /// here so downstream code never sees UI units.
    pub fn resolve(
        &self,
        source_duration: f64,
        detected_rect: Option<ScreenRect>,
        fallback_rect: ScreenRect,
    ) -> Result<CompositionConfig> {
        let trim = TrimRange::new(
            self.trim.start_seconds.unwrap_or(0.0),
            self.trim.end_seconds.unwrap_or(source_duration),
        );
        trim.validate(source_duration)?;

        let screen_rect = self
            .screen_rect
            .or(detected_rect)
            .unwrap_or(fallback_rect)
            .clamped();

        Ok(CompositionConfig {
            format: self.output.format,
            canvas_width: self.output.canvas_width,
            canvas_height: self.output.canvas_height,
            quality: self.output.quality,
            trim,
            screen_rect,
            zoom: self.placement.zoom_percent / 100.0,
            offset: NormalizedOffset::new(
                self.placement.offset_x_percent / 100.0,
                self.placement.offset_y_percent / 100.0,
            )
            .clamped(),
            fit: self.placement.fit_mode,
        })
    }
}

/// Output encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Container format for the encoded file
    pub format: OutputFormat,

    /// Canvas width in pixels. With frame artwork this is the fixed axis;
    /// the height is derived from the frame's aspect ratio.
    pub canvas_width: u32,

    /// Canvas height in pixels, used only when no frame artwork is set
    pub canvas_height: u32,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Mp4,
            canvas_width: 1080,
            canvas_height: 1920,
            quality: 90,
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.canvas_width < 16 || self.canvas_height < 16 {
            return Err(ConfigError::InvalidValue {
                key: "output.canvas_size".to_string(),
                value: format!("{}x{}", self.canvas_width, self.canvas_height)
            }.into());
        }

        if self.quality > 100 {
            return Err(ConfigError::InvalidValue {
                key: "output.quality".to_string(),
                value: self.quality.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Video placement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// How the source is fitted into the screen rect
    pub fit_mode: FitMode,

    /// Zoom as a percentage; 100 = the nominal fit-computed scale
    pub zoom_percent: f64,

    /// Horizontal displacement in percent of half the screen width (-100..100)
    pub offset_x_percent: f64,

    /// Vertical displacement in percent of half the screen height (-100..100)
    pub offset_y_percent: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            fit_mode: FitMode::Fit,
            zoom_percent: 100.0,
            offset_x_percent: 0.0,
            offset_y_percent: 0.0,
        }
    }
}

impl PlacementConfig {
    fn validate(&self) -> Result<()> {
        if !(10.0..=1000.0).contains(&self.zoom_percent) {
            return Err(ConfigError::InvalidValue {
                key: "placement.zoom_percent".to_string(),
                value: self.zoom_percent.to_string()
            }.into());
        }

        for (key, value) in [
            ("placement.offset_x_percent", self.offset_x_percent),
            ("placement.offset_y_percent", self.offset_y_percent),
        ] {
            if !(-100.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string()
                }.into());
            }
        }

        Ok(())
    }
}

/// Trim configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrimConfig {
    /// Start of the exported range in seconds; 0 when unset
    pub start_seconds: Option<f64>,

    /// End of the exported range in seconds; source duration when unset
    pub end_seconds: Option<f64>,
}

impl TrimConfig {
    fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_seconds, self.end_seconds) {
            if end <= start {
                return Err(ConfigError::InvalidValue {
                    key: "trim.range".to_string(),
                    value: format!("{}-{}", start, end)
                }.into());
            }
        }

        if let Some(start) = self.start_seconds {
            if start < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: "trim.start_seconds".to_string(),
                    value: start.to_string()
                }.into());
            }
        }

        Ok(())
    }
}

/// The single value object threaded through preview and export, so both stay
/// geometrically identical. Derived from [`Config`] by [`Config::resolve`];
/// immutable during a render.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionConfig {
    pub format: OutputFormat,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub quality: u8,
    pub trim: TrimRange,
    pub screen_rect: ScreenRect,
    /// 1.0 = nominal fit-computed scale, >1 zooms in
    pub zoom: f64,
    pub offset: NormalizedOffset,
    pub fit: FitMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original = Config::default();
        original.placement.fit_mode = FitMode::Fill;
        original.placement.zoom_percent = 120.0;
        original.screen_rect = Some(ScreenRect::new(10.0, 5.0, 80.0, 90.0));

        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded.placement.fit_mode, FitMode::Fill);
        assert_eq!(loaded.placement.zoom_percent, 120.0);
        assert_eq!(loaded.screen_rect, original.screen_rect);
        assert_eq!(loaded.output.format, OutputFormat::Mp4);
    }

    #[test]
    fn test_invalid_zoom() {
        let mut config = Config::default();
        config.placement.zoom_percent = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_offset() {
        let mut config = Config::default();
        config.placement.offset_x_percent = 150.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_trim_order() {
        let mut config = Config::default();
        config.trim.start_seconds = Some(5.0);
        config.trim.end_seconds = Some(2.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_screen_rect_precedence() {
        let detected = ScreenRect::new(10.0, 10.0, 80.0, 80.0);
        let fallback = ScreenRect::new(5.0, 5.0, 90.0, 90.0);

        // Detected wins over fallback.
        let config = Config::default();
        let resolved = config.resolve(10.0, Some(detected), fallback).unwrap();
        assert_eq!(resolved.screen_rect, detected);

        // Manual override wins over both.
        let mut config = Config::default();
        config.screen_rect = Some(ScreenRect::new(1.0, 2.0, 50.0, 60.0));
        let resolved = config.resolve(10.0, Some(detected), fallback).unwrap();
        assert_eq!(resolved.screen_rect, ScreenRect::new(1.0, 2.0, 50.0, 60.0));

        // Fallback when nothing else is available.
        let config = Config::default();
        let resolved = config.resolve(10.0, None, fallback).unwrap();
        assert_eq!(resolved.screen_rect, fallback);
    }

    #[test]
    fn test_resolve_converts_percent_knobs() {
        let mut config = Config::default();
        config.placement.zoom_percent = 150.0;
        config.placement.offset_x_percent = -50.0;
        config.placement.offset_y_percent = 25.0;

        let resolved = config
            .resolve(10.0, None, ScreenRect::full())
            .unwrap();
        assert_eq!(resolved.zoom, 1.5);
        assert_eq!(resolved.offset, NormalizedOffset::new(-0.5, 0.25));
    }

    #[test]
    fn test_resolve_defaults_trim_to_full_source() {
        let config = Config::default();
        let resolved = config.resolve(12.5, None, ScreenRect::full()).unwrap();
        assert_eq!(resolved.trim, TrimRange::new(0.0, 12.5));
    }

    #[test]
    fn test_resolve_rejects_trim_past_source() {
        let mut config = Config::default();
        config.trim.end_seconds = Some(20.0);
        assert!(config.resolve(10.0, None, ScreenRect::full()).is_err());
    }
}
