use std::sync::Arc;

use tracing::{debug, warn};

use super::evaluator::{evaluate, Groove};
use super::mute_solo::should_play;
use super::transport::Transport;
use super::trigger::{TriggerAt, VoiceTrigger};
use crate::audio::SampleBank;
use crate::audio_api::VoiceSink;
use crate::config::{SequencerConfig, SwingPolicy};
use crate::pattern::Pattern;
use crate::shared::{StepIndex, TrackIndex};

/// What one look-ahead pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PassReport {
    pub step_passes: usize,
    pub voices: usize,
    pub dropped: usize,
    // voices the audio side cut short since the previous pass
    pub stolen: u64,
    // last step whose events went out this pass
    pub last_step: Option<StepIndex>,
}

/// Look-ahead scheduler.
///
/// Each call to `run_pass` schedules every step-pass whose time falls before
/// `now + lookahead`. After a stall that may be many of them; all are sent,
/// none skipped.
pub struct Scheduler {
    lookahead: f64,
    swing: SwingPolicy,
    trigger: VoiceTrigger,
    rng: fastrand::Rng,
    stolen_seen: u64,
}

impl Scheduler {
    pub fn new(config: &SequencerConfig, bank: Arc<SampleBank>, sink: Arc<dyn VoiceSink>) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let trigger = VoiceTrigger::new(bank, sink, config.max_voice_secs(), config.reverse_samples);
        Self {
            lookahead: config.lookahead_secs(),
            swing: config.swing,
            stolen_seen: trigger.voices_stolen(),
            trigger,
            rng,
        }
    }

    pub fn run_pass(&mut self, mut transport: Transport, pattern: &Pattern, now: f64) -> (Transport, PassReport) {
        let horizon = now + self.lookahead;
        // solo state can change between passes, never within one
        let any_solo = pattern.any_solo();
        let mut report = PassReport::default();

        while transport.next_event_time < horizon {
            self.dispatch_step(&transport, pattern, any_solo, &mut report);
            report.last_step = Some(transport.current_step);
            report.step_passes += 1;
            transport.advance();
        }

        let stolen = self.trigger.voices_stolen();
        if stolen > self.stolen_seen {
            report.stolen = stolen - self.stolen_seen;
            self.stolen_seen = stolen;
            warn!(stolen = report.stolen, total = stolen, "voice pool full, oldest voices were cut");
        }

        if report.step_passes > 1 {
            debug!(
                step_passes = report.step_passes,
                now,
                next_event_time = transport.next_event_time,
                "scheduler caught up on several steps"
            );
        }
        (transport, report)
    }

    fn dispatch_step(&mut self, transport: &Transport, pattern: &Pattern, any_solo: bool, report: &mut PassReport) {
        let index = transport.current_step;
        let groove = Groove {
            swing: transport.params.swing,
            step_duration: transport.step_duration(),
            fill: transport.params.fill,
            policy: self.swing,
        };

        for (t, track) in pattern.tracks.iter().enumerate() {
            if !should_play(any_solo, track) {
                continue;
            }
            let Some(step) = track.step(index.get()) else {
                continue;
            };
            if !step.is_playable() {
                continue;
            }
            let Some(offset) = evaluate(&groove, index, step, &mut self.rng) else {
                continue;
            };

            let at = TriggerAt {
                track: TrackIndex(t),
                step: index,
                pass: transport.pass,
                start_time: transport.next_event_time + offset,
            };
            match self.trigger.fire(at, track, step, transport.params.reverse) {
                Ok(true) => report.voices += 1,
                Ok(false) => {}
                Err(err) => {
                    report.dropped += 1;
                    warn!(track = t, step = index.get(), "dropping voice: {err}");
                }
            }
        }
    }
}
