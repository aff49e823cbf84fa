// The boundary between the scheduler and whatever actually makes sound.
use std::sync::Arc;

pub use crate::audio::{SampleBuffer, SampleId};
use crate::error::VoiceError;
use crate::shared::{StepIndex, TrackIndex};

/// Per-voice part of the gain chain; the master stage lives on the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GainChain {
    pub step: f32,
    pub track: f32,
}

impl GainChain {
    pub fn total(&self) -> f32 {
        self.step * self.track
    }
}

/// Everything the audio thread needs to play one triggered step.
#[derive(Clone, Debug)]
pub struct VoiceRequest {
    pub track: TrackIndex,
    pub step: StepIndex,
    pub pass: u64,
    // absolute time on the audio clock, in seconds
    pub start_time: f64,
    pub buffer: Arc<SampleBuffer>,
    pub gain: GainChain,
    pub max_duration: f64,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The scheduler has already resolved the buffer, so the audio thread
    // never looks anything up or allocates to start a voice.
    Schedule(VoiceRequest),
    SetMasterGain(f32),
    // drop every live voice immediately
    Panic,
}

/// Monotonic clock of the audio device. `None` until the device is running.
pub trait AudioClock: Send + Sync {
    fn now(&self) -> Option<f64>;
}

/// Anything that accepts voices for future playback.
pub trait VoiceSink: Send + Sync {
    fn schedule(&self, voice: VoiceRequest) -> Result<(), VoiceError>;

    /// Running count of accepted voices later cut short to make room for
    /// newer ones. Sinks without a voice limit never steal.
    fn voices_stolen(&self) -> u64 {
        0
    }
}
