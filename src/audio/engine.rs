use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::frame::StereoFrame;
use super::voice::{Voice, VoiceEnd};
use crate::audio_api::AudioCommand;

pub const MAX_VOICES: usize = 64; // hard cap so we never allocate in the audio callback

/// Counters shared with the control side; written only by the audio thread.
#[derive(Debug, Default)]
pub struct EngineStats {
    pub voices_started: AtomicU64,
    pub voices_finished: AtomicU64,
    pub voices_forced: AtomicU64,
    // subset of voices_forced: cut to make room for a newer voice
    pub voices_stolen: AtomicU64,
}

impl EngineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            voices_started: self.voices_started.load(Ordering::Relaxed),
            voices_finished: self.voices_finished.load(Ordering::Relaxed),
            voices_forced: self.voices_forced.load(Ordering::Relaxed),
            voices_stolen: self.voices_stolen.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub voices_started: u64,
    pub voices_finished: u64,
    pub voices_forced: u64,
    pub voices_stolen: u64,
}

impl StatsSnapshot {
    pub fn voices_live(&self) -> u64 {
        self.voices_started
            .saturating_sub(self.voices_finished + self.voices_forced)
    }
}

/// The real-time side: mixes scheduled voices and owns the audio clock.
pub struct Engine {
    sample_rate: u32,
    voices: Vec<Voice>,
    master_gain: f32,
    frames: Arc<AtomicU64>,
    stats: Arc<EngineStats>,
}

impl Engine {
    pub fn new(sample_rate: u32, master_gain: f32) -> Self {
        Self {
            sample_rate,
            voices: Vec::with_capacity(MAX_VOICES),
            master_gain,
            frames: Arc::new(AtomicU64::new(0)),
            stats: Arc::new(EngineStats::default()),
        }
    }

    pub fn clock(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }

    pub fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }

    pub fn live_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Schedule(req) => {
                if self.voices.len() >= MAX_VOICES {
                    self.steal_oldest();
                }
                self.voices.push(Voice::new(req, self.sample_rate));
                self.stats.voices_started.fetch_add(1, Ordering::Relaxed);
            }
            AudioCommand::SetMasterGain(gain) => self.master_gain = gain.clamp(0.0, 1.0),
            AudioCommand::Panic => {
                let n = self.voices.len() as u64;
                self.voices.clear();
                self.stats.voices_forced.fetch_add(n, Ordering::Relaxed);
            }
        }
    }

    // A full pool gives up the voice that started first; the newest trigger
    // always wins.
    fn steal_oldest(&mut self) {
        let oldest = self
            .voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.start_frame())
            .map(|(i, _)| i);
        if let Some(i) = oldest {
            self.voices.swap_remove(i);
            self.stats.voices_forced.fetch_add(1, Ordering::Relaxed);
            self.stats.voices_stolen.fetch_add(1, Ordering::Relaxed);
        }
    }

    // Fill one block and move the clock forward by its length.
    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        let block_start = self.frames.load(Ordering::Relaxed);
        let stats = &self.stats;

        self.voices.retain_mut(|voice| match voice.render_into(block_start, out) {
            None => true,
            Some(VoiceEnd::Finished) => {
                stats.voices_finished.fetch_add(1, Ordering::Relaxed);
                false
            }
            Some(VoiceEnd::ForceStopped) => {
                stats.voices_forced.fetch_add(1, Ordering::Relaxed);
                false
            }
        });

        let master = self.master_gain;
        for frame in out.iter_mut() {
            *frame = frame.scaled(master);
        }
        self.frames.fetch_add(out.len() as u64, Ordering::Release);
    }
}
