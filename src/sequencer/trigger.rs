use std::sync::Arc;

use crate::audio::SampleBank;
use crate::audio_api::{GainChain, VoiceRequest, VoiceSink};
use crate::error::VoiceError;
use crate::pattern::{Step, Track};
use crate::shared::{StepIndex, TrackIndex};

/// Where and when a voice should land.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerAt {
    pub track: TrackIndex,
    pub step: StepIndex,
    pub pass: u64,
    pub start_time: f64,
}

/// Turns a firing step into a voice on the audio side.
pub struct VoiceTrigger {
    bank: Arc<SampleBank>,
    sink: Arc<dyn VoiceSink>,
    max_duration: f64,
    reverse_samples: bool,
}

impl VoiceTrigger {
    pub fn new(
        bank: Arc<SampleBank>,
        sink: Arc<dyn VoiceSink>,
        max_duration: f64,
        reverse_samples: bool,
    ) -> Self {
        Self {
            bank,
            sink,
            max_duration,
            reverse_samples,
        }
    }

    // `Ok(None)` for a step with nothing to play; that is normal, not an error.
    pub fn build(
        &self,
        at: TriggerAt,
        track: &Track,
        step: &Step,
        transport_reversed: bool,
    ) -> Result<Option<VoiceRequest>, VoiceError> {
        let Some(id) = step.buffer else {
            return Ok(None);
        };
        let reversed = self.reverse_samples && transport_reversed;
        let buffer = self
            .bank
            .get(id, reversed)
            .ok_or(VoiceError::UnknownBuffer(id))?;
        if buffer.is_empty() {
            return Err(VoiceError::EmptyBuffer(id));
        }

        Ok(Some(VoiceRequest {
            track: at.track,
            step: at.step,
            pass: at.pass,
            start_time: at.start_time,
            buffer,
            gain: GainChain {
                step: step.gain,
                track: track.volume,
            },
            max_duration: self.max_duration,
        }))
    }

    pub fn voices_stolen(&self) -> u64 {
        self.sink.voices_stolen()
    }

    /// Build and hand off one voice. Returns whether a voice was scheduled.
    pub fn fire(
        &self,
        at: TriggerAt,
        track: &Track,
        step: &Step,
        transport_reversed: bool,
    ) -> Result<bool, VoiceError> {
        match self.build(at, track, step, transport_reversed)? {
            Some(voice) => {
                self.sink.schedule(voice)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
