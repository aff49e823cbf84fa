use std::path::PathBuf;

use thiserror::Error;

use crate::audio::SampleId;

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("audio engine is not running; cannot read the audio clock")]
    EngineNotReady,
    #[error("could not spawn the scheduler thread")]
    Spawn(#[source] std::io::Error),
}

/// Why a single voice could not be handed to the audio thread.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum VoiceError {
    #[error("sample {0:?} is not registered in the bank")]
    UnknownBuffer(SampleId),
    #[error("sample {0:?} has no audio data")]
    EmptyBuffer(SampleId),
    #[error("audio command queue is full")]
    QueueFull,
    #[error("audio engine has shut down")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize")]
    Serialize(#[from] serde_json::Error),
}
