// The pattern data editors work on and the scheduler reads snapshots of.

use serde::{Deserialize, Serialize};

use crate::audio::SampleId;
use crate::shared::{clamp_unit, DEFAULT_NUM_TRACKS, STEPS_PER_TRACK};

/// Extra rule deciding whether a step fires on a given pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrigCondition {
    Always,
    // only while fill is held
    Fill,
    // only while fill is not held
    NotFill,
    // fixed chance in percent, replaces the step probability
    Percent(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    pub active: bool,
    pub gain: f32,
    pub probability: f32,
    pub condition: Option<TrigCondition>,

    // Runtime handle into the sample bank; it means nothing after a restart,
    // so it is never written out.
    #[serde(skip)]
    pub buffer: Option<SampleId>,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            active: false,
            gain: 1.0,
            probability: 1.0,
            condition: None,
            buffer: None,
        }
    }
}

impl Step {
    pub fn is_playable(&self) -> bool {
        self.active && self.buffer.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub ring_radius: f32,
    pub sample_path: String,
    pub volume: f32,
    pub muted: bool,
    pub solo: bool,
    pub steps: [Step; STEPS_PER_TRACK],
}

impl Default for Track {
    fn default() -> Self {
        Self::new(0)
    }
}

const TRACK_COLORS: [&str; 4] = ["#ff5f6d", "#ffc371", "#47cacc", "#8e7cc3"];

impl Track {
    pub fn new(id: u32) -> Self {
        let i = id as usize;
        Self {
            id,
            name: format!("Track {}", i + 1),
            color: TRACK_COLORS[i % TRACK_COLORS.len()].to_string(),
            // outermost ring first
            ring_radius: 1.0 - 0.15 * (i % 6) as f32,
            sample_path: String::new(),
            volume: 0.8,
            muted: false,
            solo: false,
            steps: [Step::default(); STEPS_PER_TRACK],
        }
    }

    pub fn step(&self, step: usize) -> Option<&Step> {
        self.steps.get(step)
    }

    pub fn step_mut(&mut self, step: usize) -> Option<&mut Step> {
        self.steps.get_mut(step)
    }

    pub fn active_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.active).count()
    }

    pub fn clear(&mut self) {
        for step in &mut self.steps {
            let buffer = step.buffer;
            *step = Step { buffer, ..Step::default() };
        }
    }

    // pull every value back into range after deserializing or a sloppy edit
    pub fn sanitize(&mut self) {
        self.volume = clamp_unit(self.volume);
        for step in &mut self.steps {
            step.gain = clamp_unit(step.gain);
            step.probability = clamp_unit(step.probability);
            if let Some(TrigCondition::Percent(p)) = step.condition {
                step.condition = Some(TrigCondition::Percent(p.min(100)));
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pattern {
    pub tracks: Vec<Track>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::with_tracks(DEFAULT_NUM_TRACKS)
    }
}

impl Pattern {
    pub fn with_tracks(n: usize) -> Self {
        Self {
            tracks: (0..n as u32).map(Track::new).collect(),
        }
    }

    pub fn track(&self, track: usize) -> Option<&Track> {
        self.tracks.get(track)
    }

    pub fn track_mut(&mut self, track: usize) -> Option<&mut Track> {
        self.tracks.get_mut(track)
    }

    pub fn step_mut(&mut self, track: usize, step: usize) -> Option<&mut Step> {
        self.tracks.get_mut(track).and_then(|t| t.step_mut(step))
    }

    pub fn any_solo(&self) -> bool {
        self.tracks.iter().any(|t| t.solo)
    }

    pub fn sanitize(&mut self) {
        for track in &mut self.tracks {
            track.sanitize();
        }
    }
}
