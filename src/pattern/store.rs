use std::sync::Arc;

use arc_swap::ArcSwap;

use super::model::{Pattern, TrigCondition};
use crate::audio::SampleId;
use crate::shared::clamp_unit;

/// Live, shareable pattern.
///
/// Editors go through `edit`, which clones the current pattern, applies the
/// change and swaps the result in. Readers get an `Arc<Pattern>` that never
/// changes under them, so a scheduling pass always sees one whole pattern.
#[derive(Clone)]
pub struct PatternStore {
    inner: Arc<ArcSwap<Pattern>>,
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new(Pattern::default())
    }
}

impl PatternStore {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(pattern)),
        }
    }

    pub fn snapshot(&self) -> Arc<Pattern> {
        self.inner.load_full()
    }

    // `f` may run more than once if another editor races us
    pub fn edit<F>(&self, mut f: F)
    where
        F: FnMut(&mut Pattern),
    {
        self.inner.rcu(|current| {
            let mut next = Pattern::clone(current);
            f(&mut next);
            next
        });
    }

    pub fn toggle_step(&self, track: usize, step: usize) {
        self.edit(|p| {
            if let Some(s) = p.step_mut(track, step) {
                s.active = !s.active;
            }
        });
    }

    pub fn set_step_active(&self, track: usize, step: usize, active: bool) {
        self.edit(|p| {
            if let Some(s) = p.step_mut(track, step) {
                s.active = active;
            }
        });
    }

    pub fn set_step_gain(&self, track: usize, step: usize, gain: f32) {
        let gain = clamp_unit(gain);
        self.edit(|p| {
            if let Some(s) = p.step_mut(track, step) {
                s.gain = gain;
            }
        });
    }

    pub fn set_step_probability(&self, track: usize, step: usize, probability: f32) {
        let probability = clamp_unit(probability);
        self.edit(|p| {
            if let Some(s) = p.step_mut(track, step) {
                s.probability = probability;
            }
        });
    }

    pub fn set_step_condition(&self, track: usize, step: usize, condition: Option<TrigCondition>) {
        let condition = match condition {
            Some(TrigCondition::Percent(pct)) => Some(TrigCondition::Percent(pct.min(100))),
            other => other,
        };
        self.edit(|p| {
            if let Some(s) = p.step_mut(track, step) {
                s.condition = condition;
            }
        });
    }

    pub fn set_step_buffer(&self, track: usize, step: usize, buffer: Option<SampleId>) {
        self.edit(|p| {
            if let Some(s) = p.step_mut(track, step) {
                s.buffer = buffer;
            }
        });
    }

    // every step of the track plays `buffer`
    pub fn assign_track_buffer(&self, track: usize, buffer: Option<SampleId>) {
        self.edit(|p| {
            if let Some(t) = p.track_mut(track) {
                for s in &mut t.steps {
                    s.buffer = buffer;
                }
            }
        });
    }

    pub fn set_track_volume(&self, track: usize, volume: f32) {
        let volume = clamp_unit(volume);
        self.edit(|p| {
            if let Some(t) = p.track_mut(track) {
                t.volume = volume;
            }
        });
    }

    pub fn set_muted(&self, track: usize, muted: bool) {
        self.edit(|p| {
            if let Some(t) = p.track_mut(track) {
                t.muted = muted;
            }
        });
    }

    pub fn set_solo(&self, track: usize, solo: bool) {
        self.edit(|p| {
            if let Some(t) = p.track_mut(track) {
                t.solo = solo;
            }
        });
    }

    pub fn clear_track(&self, track: usize) {
        self.edit(|p| {
            if let Some(t) = p.track_mut(track) {
                t.clear();
            }
        });
    }
}
