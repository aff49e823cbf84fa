//! Swing and probability: decides whether a step fires on a given pass and how
//! late it lands. Nothing here has side effects beyond drawing from the rng it
//! is handed.

use crate::config::{SwingParity, SwingPolicy};
use crate::pattern::{Step, TrigCondition};
use crate::shared::{clamp_bpm, clamp_unit, StepIndex, STEPS_PER_BEAT};

/// Upper bound on `SwingPolicy::max_fraction`. Keeps a swung step strictly
/// before the next straight one, so step order is never inverted.
pub const MAX_SWING_FRACTION: f64 = 0.5;

/// Length of one sixteenth note in seconds.
pub fn step_duration(bpm: f64) -> f64 {
    60.0 / clamp_bpm(bpm) / STEPS_PER_BEAT
}

/// Delay added to `step`'s start time.
pub fn swing_offset(step: StepIndex, swing: f32, step_duration: f64, policy: &SwingPolicy) -> f64 {
    let delayed = match policy.delayed {
        SwingParity::Odd => step.is_odd(),
        SwingParity::Even => !step.is_odd(),
    };
    if !delayed {
        return 0.0;
    }
    let fraction = policy.max_fraction.clamp(0.0, MAX_SWING_FRACTION);
    step_duration * clamp_unit(swing) as f64 * fraction
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConditionOutcome {
    // fire regardless of probability
    Fire,
    // never fire
    Skip,
    // fall through to the step probability
    Gate,
    // replace the step probability with this chance
    Chance(f32),
}

pub fn condition_outcome(condition: Option<TrigCondition>, fill: bool) -> ConditionOutcome {
    match condition {
        None | Some(TrigCondition::Always) => ConditionOutcome::Gate,
        Some(TrigCondition::Fill) if fill => ConditionOutcome::Fire,
        Some(TrigCondition::Fill) => ConditionOutcome::Skip,
        Some(TrigCondition::NotFill) if fill => ConditionOutcome::Skip,
        Some(TrigCondition::NotFill) => ConditionOutcome::Gate,
        Some(TrigCondition::Percent(p)) => ConditionOutcome::Chance(p.min(100) as f32 / 100.0),
    }
}

/// `draw` is uniform in [0, 1), so 1.0 always passes and 0.0 never does.
pub fn probability_gate(probability: f32, draw: f32) -> bool {
    draw < probability
}

pub fn should_fire(step: &Step, fill: bool, rng: &mut fastrand::Rng) -> bool {
    match condition_outcome(step.condition, fill) {
        ConditionOutcome::Fire => true,
        ConditionOutcome::Skip => false,
        ConditionOutcome::Gate => probability_gate(step.probability, rng.f32()),
        ConditionOutcome::Chance(chance) => probability_gate(chance, rng.f32()),
    }
}

/// Per-pass inputs to `evaluate`.
#[derive(Clone, Copy, Debug)]
pub struct Groove {
    pub swing: f32,
    pub step_duration: f64,
    pub fill: bool,
    pub policy: SwingPolicy,
}

/// `Some(offset)` when the step fires this pass, `None` otherwise.
pub fn evaluate(groove: &Groove, index: StepIndex, step: &Step, rng: &mut fastrand::Rng) -> Option<f64> {
    if !should_fire(step, groove.fill, rng) {
        return None;
    }
    Some(swing_offset(index, groove.swing, groove.step_duration, &groove.policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_with(probability: f32, condition: Option<TrigCondition>) -> Step {
        Step {
            active: true,
            probability,
            condition,
            ..Step::default()
        }
    }

    fn fire_count(step: &Step, fill: bool, trials: usize, seed: u64) -> usize {
        let mut rng = fastrand::Rng::with_seed(seed);
        (0..trials).filter(|_| should_fire(step, fill, &mut rng)).count()
    }

    #[test]
    fn sixteenth_note_durations() {
        assert_eq!(step_duration(120.0), 0.125);
        assert_eq!(step_duration(60.0), 0.25);
    }

    #[test]
    fn no_swing_means_no_offset() {
        let policy = SwingPolicy::default();
        for i in 0..16 {
            assert_eq!(swing_offset(StepIndex::new(i), 0.0, 0.125, &policy), 0.0);
        }
    }

    #[test]
    fn swing_only_delays_the_configured_parity() {
        let odd = SwingPolicy::default();
        assert_eq!(swing_offset(StepIndex::new(2), 1.0, 0.125, &odd), 0.0);
        assert!(swing_offset(StepIndex::new(3), 1.0, 0.125, &odd) > 0.0);

        let even = SwingPolicy { delayed: SwingParity::Even, ..odd };
        assert!(swing_offset(StepIndex::new(2), 1.0, 0.125, &even) > 0.0);
        assert_eq!(swing_offset(StepIndex::new(3), 1.0, 0.125, &even), 0.0);
    }

    #[test]
    fn swing_grows_monotonically_and_stays_bounded() {
        let policy = SwingPolicy::default();
        let dur = 0.125;
        let mut last = -1.0;
        for i in 0..=20 {
            let amount = i as f32 / 20.0;
            let off = swing_offset(StepIndex::new(1), amount, dur, &policy);
            assert!(off > last);
            assert!(off <= dur * policy.max_fraction + 1e-12);
            last = off;
        }
        assert!((last - dur * 0.3).abs() < 1e-12);
    }

    #[test]
    fn oversized_fraction_is_capped() {
        let policy = SwingPolicy { max_fraction: 4.0, ..SwingPolicy::default() };
        assert_eq!(swing_offset(StepIndex::new(1), 1.0, 0.2, &policy), 0.2 * MAX_SWING_FRACTION);
    }

    #[test]
    fn certain_and_impossible_probabilities() {
        assert_eq!(fire_count(&step_with(1.0, None), false, 2000, 1), 2000);
        assert_eq!(fire_count(&step_with(0.0, None), false, 2000, 2), 0);
        assert!(probability_gate(1.0, 0.999_999));
        assert!(!probability_gate(0.0, 0.0));
    }

    #[test]
    fn half_probability_is_roughly_half() {
        let fired = fire_count(&step_with(0.5, None), false, 4000, 7);
        let ratio = fired as f64 / 4000.0;
        assert!((ratio - 0.5).abs() < 0.05, "ratio was {ratio}");
    }

    #[test]
    fn fill_conditions_follow_fill_state() {
        // probability is ignored once a fill condition decides
        let fill = step_with(0.0, Some(TrigCondition::Fill));
        assert_eq!(fire_count(&fill, true, 100, 3), 100);
        assert_eq!(fire_count(&fill, false, 100, 3), 0);

        let not_fill = step_with(1.0, Some(TrigCondition::NotFill));
        assert_eq!(fire_count(&not_fill, true, 100, 4), 0);
        assert_eq!(fire_count(&not_fill, false, 100, 4), 100);
    }

    #[test]
    fn percent_condition_overrides_step_probability() {
        let never = step_with(1.0, Some(TrigCondition::Percent(0)));
        assert_eq!(fire_count(&never, false, 500, 5), 0);

        let always = step_with(0.0, Some(TrigCondition::Percent(100)));
        assert_eq!(fire_count(&always, false, 500, 6), 500);

        let quarter = step_with(1.0, Some(TrigCondition::Percent(25)));
        let ratio = fire_count(&quarter, false, 4000, 8) as f64 / 4000.0;
        assert!((ratio - 0.25).abs() < 0.05, "ratio was {ratio}");
    }

    #[test]
    fn evaluate_returns_offset_only_when_firing() {
        let groove = Groove {
            swing: 1.0,
            step_duration: 0.125,
            fill: false,
            policy: SwingPolicy::default(),
        };
        let mut rng = fastrand::Rng::with_seed(9);
        let on = step_with(1.0, None);
        let off = step_with(0.0, None);
        assert_eq!(evaluate(&groove, StepIndex::new(0), &on, &mut rng), Some(0.0));
        assert!(evaluate(&groove, StepIndex::new(1), &on, &mut rng).unwrap() > 0.0);
        assert_eq!(evaluate(&groove, StepIndex::new(1), &off, &mut rng), None);
    }
}
