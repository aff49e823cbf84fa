use super::evaluator::step_duration;
use crate::shared::{clamp_bpm, clamp_unit, StepIndex, DEFAULT_BPM};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Playing,
}

/// Knobs an editor may turn at any time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportParams {
    pub bpm: f64,
    pub swing: f32,
    pub reverse: bool,
    pub fill: bool,
}

impl Default for TransportParams {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            swing: 0.0,
            reverse: false,
            fill: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamChange {
    Bpm(f64),
    Swing(f32),
    Reverse(bool),
    Fill(bool),
}

impl TransportParams {
    pub fn apply(&mut self, change: ParamChange) {
        match change {
            ParamChange::Bpm(bpm) => self.bpm = clamp_bpm(bpm),
            ParamChange::Swing(swing) => self.swing = clamp_unit(swing),
            ParamChange::Reverse(reverse) => self.reverse = reverse,
            ParamChange::Fill(fill) => self.fill = fill,
        }
    }
}

/// Scheduler-owned position plus the parameters it runs with.
///
/// Handed to each scheduling pass by value and handed back advanced; nothing
/// else writes `current_step`, `next_event_time` or `pass`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transport {
    pub params: TransportParams,
    pub current_step: StepIndex,
    // seconds on the audio clock of the next step-pass not yet scheduled
    pub next_event_time: f64,
    // step-passes scheduled since start
    pub pass: u64,
}

impl Transport {
    pub fn new(params: TransportParams, start_step: StepIndex, first_event_time: f64) -> Self {
        Self {
            params,
            current_step: start_step,
            next_event_time: first_event_time,
            pass: 0,
        }
    }

    pub fn step_duration(&self) -> f64 {
        step_duration(self.params.bpm)
    }

    // Moves on by one step. Time is accumulated, not recomputed from `pass`,
    // so a tempo change only affects steps after it.
    pub fn advance(&mut self) {
        self.current_step = self.current_step.advance(self.params.reverse);
        self.next_event_time += self.step_duration();
        self.pass += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_advance_moves_time_and_step() {
        let mut t = Transport::new(TransportParams::default(), StepIndex::new(0), 1.0);
        t.advance();
        assert_eq!(t.current_step, StepIndex::new(1));
        assert_eq!(t.next_event_time, 1.125);
        assert_eq!(t.pass, 1);
    }

    #[test]
    fn reverse_from_zero_goes_to_fifteen() {
        let params = TransportParams { reverse: true, ..TransportParams::default() };
        let mut t = Transport::new(params, StepIndex::new(0), 0.0);
        t.advance();
        assert_eq!(t.current_step, StepIndex::new(15));
        t.advance();
        assert_eq!(t.current_step, StepIndex::new(14));
    }

    #[test]
    fn params_are_clamped() {
        let mut p = TransportParams::default();
        p.apply(ParamChange::Bpm(900.0));
        p.apply(ParamChange::Swing(-3.0));
        assert_eq!(p.bpm, 200.0);
        assert_eq!(p.swing, 0.0);
    }

    #[test]
    fn nan_tempo_keeps_time_moving() {
        let mut t = Transport::new(TransportParams::default(), StepIndex::new(0), 0.0);
        t.params.apply(ParamChange::Bpm(f64::NAN));
        t.advance();
        assert_eq!(t.params.bpm, 120.0);
        assert_eq!(t.next_event_time, 0.125);
    }

    #[test]
    fn sixteen_steps_at_120_take_two_seconds() {
        let mut t = Transport::new(TransportParams::default(), StepIndex::new(0), 0.0);
        for _ in 0..16 {
            t.advance();
        }
        assert_eq!(t.current_step, StepIndex::new(0));
        assert!((t.next_event_time - 2.0).abs() < 1e-9);
    }
}
