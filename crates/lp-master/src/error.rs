//! Error types for the controller and its configuration.

use std::path::PathBuf;

use lp_audio::AudioError;
use thiserror::Error;

/// Failure loading, saving or validating a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure opening an external MIDI input.
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("MIDI backend init failed: {0}")]
    Init(#[from] midir::InitError),
    #[error("no MIDI input ports available")]
    NoPorts,
    #[error("no MIDI input port matching {0:?}")]
    PortNotFound(String),
    #[error("cannot connect MIDI input {port}: {reason}")]
    Connect { port: String, reason: String },
}

/// Top-level error for [`Controller`](crate::Controller) operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Midi(#[from] MidiError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("playback thread exited before reporting device status")]
    ThreadExited,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
