//! Front-end settings, stored as TOML.
//!
//! Every section and field falls back to its default when absent, so an
//! empty file (or no file at all) gives a working configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use lp_core::{SkipSched, SKIP_WINDOW};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub skip: SkipConfig,
    #[serde(default)]
    pub midi: MidiConfig,
}

/// Resampling algorithm between the emulation rate and the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResamplerKind {
    #[default]
    Linear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Requested device rate in Hz (default: 48000)
    #[serde(default = "default_rate")]
    pub rate: u32,
    /// Device ring length in milliseconds (default: 133)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u32,
    /// Device buffer periods per ring (default: 4)
    #[serde(default = "default_periods")]
    pub periods: u32,
    #[serde(default)]
    pub resampler: ResamplerKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Loop statistics are logged every this many iterations (default: 600)
    #[serde(default = "default_frames_per_stats")]
    pub frames_per_stats: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipConfig {
    /// Longest run of consecutive skipped frames (default: 4)
    #[serde(default = "default_max_run")]
    pub max_run: u32,
    /// Low readings within the window needed to skip (default: 2)
    #[serde(default = "default_quorum")]
    pub quorum: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiConfig {
    /// Messages buffered between the MIDI thread and the loop (default: 32)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Link shift-ins per MIDI clock (default: 8)
    #[serde(default = "default_ticks_per_clock")]
    pub ticks_per_clock: u8,
}

fn default_rate() -> u32 {
    48_000
}
fn default_latency_ms() -> u32 {
    133
}
fn default_periods() -> u32 {
    4
}
fn default_frames_per_stats() -> u32 {
    600
}
fn default_max_run() -> u32 {
    SkipSched::DEFAULT_MAX_RUN
}
fn default_quorum() -> usize {
    SkipSched::DEFAULT_QUORUM
}
fn default_queue_capacity() -> usize {
    32
}
fn default_ticks_per_clock() -> u8 {
    lp_core::midi::DEFAULT_TICKS_PER_CLOCK
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            latency_ms: default_latency_ms(),
            periods: default_periods(),
            resampler: ResamplerKind::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frames_per_stats: default_frames_per_stats(),
        }
    }
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            max_run: default_max_run(),
            quorum: default_quorum(),
        }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            ticks_per_clock: default_ticks_per_clock(),
        }
    }
}

impl Config {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file (or no path) yields
    /// the defaults. A file that exists but is malformed is still an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Write as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.audio.rate == 0 {
            return invalid("audio.rate must be positive");
        }
        if self.audio.latency_ms == 0 {
            return invalid("audio.latency_ms must be positive");
        }
        if self.audio.periods == 0 {
            return invalid("audio.periods must be positive");
        }
        if self.skip.max_run == 0 {
            return invalid("skip.max_run must be positive");
        }
        if self.skip.quorum == 0 || self.skip.quorum > SKIP_WINDOW {
            return Err(ConfigError::Invalid(format!(
                "skip.quorum must be between 1 and {}",
                SKIP_WINDOW
            )));
        }
        if self.midi.queue_capacity == 0 {
            return invalid("midi.queue_capacity must be positive");
        }
        Ok(())
    }

    pub fn skip_sched(&self) -> SkipSched {
        SkipSched::new(self.skip.quorum, self.skip.max_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.audio.rate, 48_000);
        assert_eq!(config.audio.latency_ms, 133);
        assert_eq!(config.audio.periods, 4);
        assert_eq!(config.audio.resampler, ResamplerKind::Linear);
        assert_eq!(config.timing.frames_per_stats, 600);
        assert_eq!(config.skip.max_run, 4);
        assert_eq!(config.skip.quorum, 2);
        assert_eq!(config.midi.queue_capacity, 32);
        assert_eq!(config.midi.ticks_per_clock, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_partial_audio() {
        let toml_str = r#"
[audio]
rate = 44100
resampler = "linear"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.audio.rate, 44_100);
        assert_eq!(config.audio.latency_ms, 133); // default
        assert_eq!(config.skip, SkipConfig::default());
    }

    #[test]
    fn test_unknown_resampler_is_rejected() {
        let toml_str = r#"
[audio]
resampler = "sinc"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.skip.quorum = SKIP_WINDOW + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.audio.periods = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.skip.max_run = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("linkpace.toml");

        let mut config = Config::default();
        config.audio.rate = 44_100;
        config.skip.quorum = 3;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(Config::load_or_default(Some(&path)).unwrap(), Config::default());
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }

    #[test]
    fn test_load_reports_parse_and_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");

        std::fs::write(&path, "[audio\nrate = 1").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));

        std::fs::write(&path, "[audio]\nrate = 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }
}
