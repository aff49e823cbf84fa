//! Stand-ins for the audio device, for driving the scheduler without hardware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::audio::{SampleBuffer, StereoFrame};
use crate::audio_api::{AudioClock, VoiceRequest, VoiceSink};
use crate::error::VoiceError;

const UNSET: u64 = u64::MAX;

/// Clock that only moves when told to. Starts out unavailable, like an audio
/// device that has not started yet.
#[derive(Debug)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self { bits: AtomicU64::new(UNSET) }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running_at(secs: f64) -> Self {
        let clock = Self::new();
        clock.set(secs);
        clock
    }

    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, secs: f64) {
        let now = self.now().unwrap_or(0.0);
        self.set(now + secs);
    }

    pub fn stop(&self) {
        self.bits.store(UNSET, Ordering::Release);
    }
}

impl AudioClock for ManualClock {
    fn now(&self) -> Option<f64> {
        match self.bits.load(Ordering::Acquire) {
            UNSET => None,
            bits => Some(f64::from_bits(bits)),
        }
    }
}

/// Sink that keeps every voice it is given, or refuses them all on request.
#[derive(Debug, Default)]
pub struct RecordingSink {
    voices: Mutex<Vec<VoiceRequest>>,
    failure: Mutex<Option<VoiceError>>,
    stolen: AtomicU64,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voices(&self) -> Vec<VoiceRequest> {
        self.voices.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut v) = self.voices.lock() {
            v.clear();
        }
    }

    // pretend the audio side had to drop `n` more voices
    pub fn steal(&self, n: u64) {
        self.stolen.fetch_add(n, Ordering::Relaxed);
    }

    pub fn fail_with(&self, failure: Option<VoiceError>) {
        if let Ok(mut f) = self.failure.lock() {
            *f = failure;
        }
    }
}

impl VoiceSink for RecordingSink {
    fn schedule(&self, voice: VoiceRequest) -> Result<(), VoiceError> {
        if let Some(err) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(err);
        }
        if let Ok(mut v) = self.voices.lock() {
            v.push(voice);
        }
        Ok(())
    }

    fn voices_stolen(&self) -> u64 {
        self.stolen.load(Ordering::Relaxed)
    }
}

/// Short mono sine, handy as a non-empty sample.
pub fn sine_buffer(freq: f32, secs: f32, sample_rate: u32) -> SampleBuffer {
    let n = (secs * sample_rate as f32) as usize;
    let data = (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            StereoFrame::mono((std::f32::consts::TAU * freq * t).sin() * 0.5)
        })
        .collect();
    SampleBuffer::from_frames(data)
}
