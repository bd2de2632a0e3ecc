use crate::error::{Result, ViewerError};
use crate::transform::{RenderTransform, Rotation};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ViewerConfig {
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Camera preview geometry and timing
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    /// Preview width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Preview height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Camera framerate
    #[serde(default = "default_framerate")]
    pub framerate: u32,

    /// Camera rotation in degrees: 0, 90, 180 or 270
    #[serde(default)]
    pub rotation: Rotation,

    /// Show the preview full-screen instead of in a window
    #[serde(default = "default_fullscreen")]
    pub fullscreen: bool,

    /// Capture buffers queued by the camera
    #[serde(default = "default_buffer_count")]
    pub buffer_count: u32,
}

/// Command-line overrides for the preview section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub framerate: Option<u32>,
    pub rotation: Option<Rotation>,
    pub fullscreen: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    /// Number of measurement runs
    #[serde(default = "default_runs")]
    pub runs: u32,

    /// Warm-up seconds per run
    #[serde(default = "default_warmup_seconds")]
    pub warmup_seconds: u32,

    /// Measurement seconds per run
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u32,

    /// Output JSON file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Shutdown poll interval inside the render loop
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Shutdown poll interval of the legacy overlay preview
    #[serde(default = "default_legacy_poll_interval_ms")]
    pub legacy_poll_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct DisplayConfig {
    /// X display to use, e.g. ":0"; inherits DISPLAY when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ViewerConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from_file("picamviewer.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("preview.width", default_width())?
            .set_default("preview.height", default_height())?
            .set_default("preview.framerate", default_framerate())?
            .set_default("preview.rotation", 0)?
            .set_default("preview.fullscreen", default_fullscreen())?
            .set_default("preview.buffer_count", default_buffer_count())?
            .set_default("benchmark.runs", default_runs())?
            .set_default("benchmark.warmup_seconds", default_warmup_seconds())?
            .set_default("benchmark.duration_seconds", default_duration_seconds())?
            .set_default("lifecycle.poll_interval_ms", default_poll_interval_ms())?
            .set_default(
                "lifecycle.legacy_poll_interval_ms",
                default_legacy_poll_interval_ms(),
            )?
            .add_source(File::with_name(&path_str).required(false))
            // PICAMVIEWER_PREVIEW__WIDTH=1280
            .add_source(
                Environment::with_prefix("PICAMVIEWER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ViewerConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.preview.validate()?;
        self.benchmark.validate()?;
        self.lifecycle.validate()
    }

    /// Default configuration rendered as TOML
    pub fn default_toml() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}

impl PreviewConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ViewerError::config(format!(
                "Preview size must be greater than 0 (got {}x{})",
                self.width, self.height
            )));
        }

        if self.framerate == 0 {
            return Err(ViewerError::config("Framerate must be greater than 0"));
        }

        if self.buffer_count == 0 {
            return Err(ViewerError::config("Buffer count must be greater than 0"));
        }

        Ok(())
    }

    pub fn apply(&mut self, overrides: &PreviewOverrides) {
        if let Some(width) = overrides.width {
            self.width = width;
        }
        if let Some(height) = overrides.height {
            self.height = height;
        }
        if let Some(framerate) = overrides.framerate {
            self.framerate = framerate;
        }
        if let Some(rotation) = overrides.rotation {
            self.rotation = rotation;
        }
        if let Some(fullscreen) = overrides.fullscreen {
            self.fullscreen = fullscreen;
        }
    }

    /// Minimum and maximum frame duration in microseconds
    pub fn frame_duration_limits(&self) -> (u64, u64) {
        let frame_us = 1_000_000 / self.framerate.max(1) as u64;
        (frame_us, frame_us)
    }

    /// Interval between render ticks of the preview loop
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.framerate.max(1)
    }

    pub fn transform(&self) -> RenderTransform {
        self.rotation.transform()
    }
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(ViewerError::config("Benchmark runs must be greater than 0"));
        }

        if self.warmup_seconds == 0 {
            return Err(ViewerError::config(
                "Benchmark warm-up seconds must be greater than 0",
            ));
        }

        if self.duration_seconds == 0 {
            return Err(ViewerError::config(
                "Benchmark duration seconds must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_seconds as u64)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds as u64)
    }
}

impl LifecycleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 || self.legacy_poll_interval_ms == 0 {
            return Err(ViewerError::config(
                "Shutdown poll intervals must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn legacy_poll_interval(&self) -> Duration {
        Duration::from_millis(self.legacy_poll_interval_ms)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            preview: PreviewConfig::default(),
            benchmark: BenchmarkConfig::default(),
            lifecycle: LifecycleConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            framerate: default_framerate(),
            rotation: Rotation::default(),
            fullscreen: default_fullscreen(),
            buffer_count: default_buffer_count(),
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            warmup_seconds: default_warmup_seconds(),
            duration_seconds: default_duration_seconds(),
            output: None,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            legacy_poll_interval_ms: default_legacy_poll_interval_ms(),
        }
    }
}

// Default value functions
fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}
fn default_framerate() -> u32 {
    30
}
fn default_fullscreen() -> bool {
    true
}
fn default_buffer_count() -> u32 {
    2
} // Enough for display, keeps queue depth and latency low

fn default_runs() -> u32 {
    5
}
fn default_warmup_seconds() -> u32 {
    10
}
fn default_duration_seconds() -> u32 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}
fn default_legacy_poll_interval_ms() -> u64 {
    100
}
