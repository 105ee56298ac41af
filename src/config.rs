//! Scene configuration, optionally read from a TOML file.
//!
//! Every section is `#[serde(default)]`, so a file only needs to mention the
//! values it overrides.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::overlay::format_clock;

pub const DEFAULT_CONFIG_FILE: &str = "holoscene.toml";
pub const DEFAULT_CLOCK_FORMAT: &str = "%-I:%M:%S %p";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid range for {field}: min {min} is greater than max {max}")]
    InvalidRange { field: &'static str, min: f32, max: f32 },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    #[error("invalid clock format {0:?}")]
    InvalidClockFormat(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraOptions,
    pub scene: SceneOptions,
    pub post_processing: PostProcessingOptions,
    pub overlay: OverlayOptions,
    pub assets: AssetOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub enable_pan: bool,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians from the +Y axis.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Fraction of the pending rotation applied per frame. Zero disables damping.
    pub damping: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, 10.0],
            target: [0.0, 0.0, 0.0],
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            enable_pan: false,
            min_distance: 5.0,
            max_distance: 20.0,
            min_polar_angle: FRAC_PI_4,
            max_polar_angle: FRAC_PI_2,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            damping: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneOptions {
    pub particle_count: usize,
    pub star_count: usize,
    pub labels: Vec<String>,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            star_count: 5000,
            labels: [
                "BOLT HACKATHON 2025",
                "$1M+ PRIZE POOL",
                "100,000 DEVELOPERS",
                "RAPID CHALLENGES",
                "REAL-WORLD IMPACT",
                "NETWORKING & EXPOSURE",
                "CUTTING-EDGE TECH",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostProcessingOptions {
    pub bloom: BloomOptions,
    pub chromatic_aberration: ChromaticAberrationOptions,
    pub scanline: ScanlineOptions,
    pub glitch: GlitchOptions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomOptions {
    pub enabled: bool,
    pub intensity: f32,
    pub luminance_threshold: f32,
    pub luminance_smoothing: f32,
}

impl Default for BloomOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 1.5,
            luminance_threshold: 0.1,
            luminance_smoothing: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChromaticAberrationOptions {
    pub enabled: bool,
    /// Per-channel UV offset.
    pub offset: [f32; 2],
}

impl Default for ChromaticAberrationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            offset: [0.002, 0.002],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanlineOptions {
    pub enabled: bool,
    /// Scanlines per pixel row, scaled by the viewport height.
    pub density: f32,
    pub opacity: f32,
}

impl Default for ScanlineOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            density: 2.0,
            opacity: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GlitchOptions {
    pub enabled: bool,
    /// Seconds between glitches, `[min, max]`.
    pub delay: [f32; 2],
    /// Seconds a glitch lasts, `[min, max]`.
    pub duration: [f32; 2],
    pub strength: [f32; 2],
}

impl Default for GlitchOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: [1.5, 3.5],
            duration: [0.2, 0.4],
            strength: [0.2, 0.4],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayOptions {
    pub enabled: bool,
    pub title: String,
    pub instructions: Vec<String>,
    pub link: String,
    /// `chrono` format string for the wall clock.
    pub clock_format: String,
    pub color: [u8; 3],
    pub font_size: f32,
    pub title_font_size: f32,
    /// Distance from the window edges in logical pixels.
    pub margin: f32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "bolt.new".to_owned(),
            instructions: vec![
                "DRAG to rotate | SCROLL to zoom".to_owned(),
                "HOVER over orbs to interact".to_owned(),
            ],
            link: "x.com/sagevedant".to_owned(),
            clock_format: DEFAULT_CLOCK_FORMAT.to_owned(),
            color: [0x22, 0xd3, 0xee],
            font_size: 14.0,
            title_font_size: 18.0,
            margin: 16.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetOptions {
    pub label_font: PathBuf,
    pub shader_hot_reload: bool,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            label_font: PathBuf::from("assets/fonts/Roboto-Regular.ttf"),
            shader_hot_reload: true,
        }
    }
}

impl SceneConfig {
    /// Loads `path`, or the default config file if it exists, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default_path.is_file() {
                    log::info!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let source = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        log::info!("Loading config from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        let glitch = &self.post_processing.glitch;

        check_range("camera.distance", camera.min_distance, camera.max_distance)?;
        check_range(
            "camera.polar_angle",
            camera.min_polar_angle,
            camera.max_polar_angle,
        )?;
        check_range("post_processing.glitch.delay", glitch.delay[0], glitch.delay[1])?;
        check_range(
            "post_processing.glitch.duration",
            glitch.duration[0],
            glitch.duration[1],
        )?;
        check_range(
            "post_processing.glitch.strength",
            glitch.strength[0],
            glitch.strength[1],
        )?;

        for (field, [min, _]) in [
            ("post_processing.glitch.delay", glitch.delay),
            ("post_processing.glitch.duration", glitch.duration),
            ("post_processing.glitch.strength", glitch.strength),
        ] {
            if min < 0.0 || min.is_nan() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must not be negative",
                });
            }
        }

        if glitch.delay[0] + glitch.duration[0] <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "post_processing.glitch",
                reason: "delay and duration must not both be zero",
            });
        }

        let clock_format = &self.overlay.clock_format;
        if format_clock(NaiveTime::default(), clock_format).is_none() {
            return Err(ConfigError::InvalidClockFormat(clock_format.clone()));
        }

        Ok(())
    }
}

fn check_range(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvalidRange { field, min, max });
    }
    Ok(())
}
