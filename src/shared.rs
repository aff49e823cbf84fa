// Constants and small types shared by the pattern model, the scheduler and the
// audio side.
//
// The rough shape of things:
//   - Editors (a UI, the demo binary, tests) mutate the pattern through
//     `PatternStore` whenever they like.
//   - The scheduler thread takes one snapshot of the pattern per tick, works
//     out which (track, step) pairs are due inside the look-ahead window and
//     hands `VoiceRequest`s to the audio side.
//   - The audio callback mixes those voices at their exact start frames and is
//     the only thing that ever touches sample data in real time.
//   - Observers poll `Sequencer::current_step()` to draw the playhead.

pub const STEPS_PER_TRACK: usize = 16;
pub const DEFAULT_NUM_TRACKS: usize = 4;

pub const MIN_BPM: f64 = 40.0;
pub const MAX_BPM: f64 = 200.0;
pub const DEFAULT_BPM: f64 = 120.0;

// sixteenth notes
pub const STEPS_PER_BEAT: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrackIndex(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepIndex(u8);

impl StepIndex {
    pub fn new(step: usize) -> Self {
        Self((step % STEPS_PER_TRACK) as u8)
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }

    pub fn is_odd(self) -> bool {
        self.0 % 2 == 1
    }

    // wraps in both directions, so going back from 0 lands on 15
    pub fn advance(self, reverse: bool) -> Self {
        let n = STEPS_PER_TRACK as u8;
        if reverse {
            Self((self.0 + n - 1) % n)
        } else {
            Self((self.0 + 1) % n)
        }
    }
}

// NaN would poison the accumulated step time for good, so it falls back to
// the default tempo.
pub fn clamp_bpm(bpm: f64) -> f64 {
    if bpm.is_nan() {
        DEFAULT_BPM
    } else {
        bpm.clamp(MIN_BPM, MAX_BPM)
    }
}

pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
