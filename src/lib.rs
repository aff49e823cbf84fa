//! ringseq - a circular multi-track step sequencer
//!
//! The crate is built around a look-ahead scheduler:
//! - `pattern`: tracks and steps, edited live through a snapshotting store
//! - `sequencer`: swing/probability, mute/solo, the scheduler and its thread
//! - `audio`: the cpal output stream that mixes scheduled voices
//! - `loader`: WAV files into the sample bank

pub mod audio;
pub mod audio_api;
pub mod config;
pub mod error;
pub mod loader;
pub mod pattern;
pub mod sequencer;
pub mod shared;
pub mod testing;

// Re-export commonly used types
pub use audio::{start_audio, AudioHandle, AudioPort, SampleBank, SampleBuffer, SampleId};
pub use audio_api::{AudioClock, AudioCommand, GainChain, VoiceRequest, VoiceSink};
pub use config::{SequencerConfig, StopPolicy, SwingParity, SwingPolicy};
pub use error::{ConfigError, SequencerError, VoiceError};
pub use pattern::{Pattern, PatternStore, Step, Track, TrigCondition};
pub use sequencer::{PlayState, Sequencer};
