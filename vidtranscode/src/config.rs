/*!
    Transcode profile: the video and audio settings every job is encoded with.
*/

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest CRF accepted by libx264 for 8-bit output.
pub const MAX_CRF: u8 = 51;

/**
    Errors from loading or validating a transcode profile.
*/
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("resolution must be positive, got {0}x{1}")]
    Resolution(u32, u32),

    #[error("crf must be between 0 and 51, got {0}")]
    Crf(u8),

    #[error("invalid audio bitrate '{0}', expected a number with an optional k/M suffix")]
    Bitrate(String),

    #[error("mic volume must be between 0 and 1, got {0}")]
    MicVolume(f64),

    #[error("noise reduction must be between 1 and 97 dB, got {0}")]
    ReductionDb(u32),

    #[error("noise floor must be between -80 and -20 dB, got {0}")]
    NoiseFloorDb(i32),
}

/**
    Complete transcode profile.

    Every section falls back to the default profile when omitted, so a file
    only needs to list the values it changes.
*/
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub video: VideoConfig,
    pub audio: AudioConfig,
}

/// Video encode settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Output width in pixels.
    pub res_x: u32,
    /// Output height in pixels.
    pub res_y: u32,
    /// Constant rate factor; lower is higher quality.
    pub crf: u8,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            res_x: 2560,
            res_y: 1440,
            crf: 24,
        }
    }
}

/// Audio encode settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Bitrate label passed straight to the encoder, e.g. `192k` or `1.5M`.
    pub bitrate: String,
    pub channel_mixdown: MixdownConfig,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bitrate: "192k".to_string(),
            channel_mixdown: MixdownConfig::default(),
        }
    }
}

/**
    Merging of the microphone track (second audio stream) into the
    primary audio track.
*/
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MixdownConfig {
    pub enabled: bool,
    /// Gain applied to the microphone before merging, in `[0, 1]`.
    pub mic_volume: f64,
    pub noise_reduction: NoiseReductionConfig,
}

impl Default for MixdownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mic_volume: 0.85,
            noise_reduction: NoiseReductionConfig::default(),
        }
    }
}

/// FFT denoise applied to the microphone track.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NoiseReductionConfig {
    pub enabled: bool,
    pub reduction_db: u32,
    pub noise_floor_db: i32,
}

impl Default for NoiseReductionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reduction_db: 20,
            noise_floor_db: -40,
        }
    }
}

impl Config {
    /**
        Load and validate a profile from a YAML file.
    */
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /**
        Parse and validate a profile from YAML text.
    */
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /**
        Check every field against the range the encoder accepts.

        Noise reduction settings are only checked when they would end up in
        the filter graph.
    */
    pub fn validate(&self) -> Result<(), ConfigError> {
        let video = &self.video;
        if video.res_x == 0 || video.res_y == 0 {
            return Err(ConfigError::Resolution(video.res_x, video.res_y));
        }
        if video.crf > MAX_CRF {
            return Err(ConfigError::Crf(video.crf));
        }

        if !is_valid_bitrate(&self.audio.bitrate) {
            return Err(ConfigError::Bitrate(self.audio.bitrate.clone()));
        }

        let mixdown = &self.audio.channel_mixdown;
        if !mixdown.enabled {
            return Ok(());
        }
        if !mixdown.mic_volume.is_finite() || !(0.0..=1.0).contains(&mixdown.mic_volume) {
            return Err(ConfigError::MicVolume(mixdown.mic_volume));
        }

        let nr = &mixdown.noise_reduction;
        if nr.enabled {
            if !(1..=97).contains(&nr.reduction_db) {
                return Err(ConfigError::ReductionDb(nr.reduction_db));
            }
            if !(-80..=-20).contains(&nr.noise_floor_db) {
                return Err(ConfigError::NoiseFloorDb(nr.noise_floor_db));
            }
        }

        Ok(())
    }
}

fn is_valid_bitrate(bitrate: &str) -> bool {
    let number = bitrate.strip_suffix(['k', 'K', 'M']).unwrap_or(bitrate);
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match number.split_once('.') {
        Some((whole, fraction)) => is_digits(whole) && is_digits(fraction),
        None => is_digits(number),
    }
}
