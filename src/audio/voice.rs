use std::sync::Arc;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use crate::audio_api::VoiceRequest;
use crate::shared::{StepIndex, TrackIndex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoiceEnd {
    Finished,
    ForceStopped,
}

/// One triggered step being played back on the audio thread.
///
/// The voice owns its buffer handle and its share of the gain chain; removing
/// it from the engine's list is all the cleanup there is, whichever way it
/// ended.
#[derive(Clone, Debug)]
pub struct Voice {
    pub track: TrackIndex,
    pub step: StepIndex,
    buffer: Arc<SampleBuffer>,
    start_frame: u64,
    gain: f32,
    pos: usize,
    max_frames: u64,
}

impl Voice {
    pub fn new(req: VoiceRequest, sample_rate: u32) -> Self {
        let sr = sample_rate as f64;
        let start_frame = (req.start_time.max(0.0) * sr).round() as u64;
        let max_frames = (req.max_duration.max(0.0) * sr).round() as u64;
        Self {
            track: req.track,
            step: req.step,
            buffer: req.buffer,
            start_frame,
            gain: req.gain.total(),
            pos: 0,
            max_frames,
        }
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    pub fn frames_played(&self) -> usize {
        self.pos
    }

    // Mix this voice into `out`, whose first frame sits at `block_start` on the
    // engine clock. A voice that arrives late starts at the top of the block.
    pub fn render_into(&mut self, block_start: u64, out: &mut [StereoFrame]) -> Option<VoiceEnd> {
        let offset = self.start_frame.saturating_sub(block_start);
        if offset >= out.len() as u64 {
            return None;
        }
        let data = &self.buffer.data;

        for frame in out[offset as usize..].iter_mut() {
            if self.pos >= data.len() {
                return Some(VoiceEnd::Finished);
            }
            if self.pos as u64 >= self.max_frames {
                return Some(VoiceEnd::ForceStopped);
            }
            *frame += data[self.pos].scaled(self.gain);
            self.pos += 1;
        }

        if self.pos >= data.len() {
            Some(VoiceEnd::Finished)
        } else if self.pos as u64 >= self.max_frames {
            Some(VoiceEnd::ForceStopped)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::GainChain;

    fn request(start_time: f64, len: usize, max_duration: f64) -> VoiceRequest {
        VoiceRequest {
            track: TrackIndex(0),
            step: StepIndex::new(0),
            pass: 0,
            start_time,
            buffer: Arc::new(SampleBuffer::from_frames(vec![StereoFrame::mono(1.0); len])),
            gain: GainChain { step: 0.5, track: 0.5 },
            max_duration,
        }
    }

    #[test]
    fn starts_at_its_frame_inside_the_block() {
        let mut v = Voice::new(request(0.002, 10, 1.0), 1000);
        let mut out = [StereoFrame::zero(); 4];
        assert_eq!(v.render_into(0, &mut out), None);
        assert_eq!(out[1].left, 0.0);
        assert_eq!(out[2].left, 0.25);
        assert_eq!(out[3].left, 0.25);
        assert_eq!(v.frames_played(), 2);
    }

    #[test]
    fn waits_for_a_later_block() {
        let mut v = Voice::new(request(1.0, 10, 1.0), 1000);
        let mut out = [StereoFrame::zero(); 64];
        assert_eq!(v.render_into(0, &mut out), None);
        assert_eq!(v.frames_played(), 0);
    }

    #[test]
    fn reports_natural_end() {
        let mut v = Voice::new(request(0.0, 3, 1.0), 1000);
        let mut out = [StereoFrame::zero(); 8];
        assert_eq!(v.render_into(0, &mut out), Some(VoiceEnd::Finished));
        assert_eq!(out[3].left, 0.0);
    }

    #[test]
    fn force_stops_at_duration_ceiling() {
        let mut v = Voice::new(request(0.0, 100, 0.005), 1000);
        let mut out = [StereoFrame::zero(); 16];
        assert_eq!(v.render_into(0, &mut out), Some(VoiceEnd::ForceStopped));
        assert_eq!(v.frames_played(), 5);
        assert_eq!(out[5].left, 0.0);
    }
}
