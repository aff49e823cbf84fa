use std::path::Path;

use anyhow::Context;

use super::frame::StereoFrame;

/// Decoded, immutable audio at the engine's sample rate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>,
}

impl SampleBuffer {
    pub fn from_frames(data: Vec<StereoFrame>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.data.len() as f64 / sample_rate as f64
    }

    // A time-reversed copy. Only ever called off the audio thread.
    pub fn reversed(&self) -> Self {
        let mut data = self.data.clone();
        data.reverse();
        Self { data }
    }

    // Load a WAV file and convert it to stereo frames at `target_rate`
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let channels = spec.channels.max(1) as usize;
        let frames: Vec<StereoFrame> = if channels == 1 {
            samples.into_iter().map(StereoFrame::mono).collect()
        } else {
            // anything past the first two channels is dropped
            samples
                .chunks_exact(channels)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect()
        };

        Ok(Self {
            data: resample_linear(&frames, spec.sample_rate, target_rate),
        })
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || source_rate == 0 || target_rate == 0 {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let last = frames.last().copied().unwrap_or_default();

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            if idx + 1 >= frames.len() {
                return last;
            }
            let t = (src_pos - idx as f64) as f32;
            let (a, b) = (frames[idx], frames[idx + 1]);
            StereoFrame {
                left: a.left + (b.left - a.left) * t,
                right: a.right + (b.right - a.right) * t,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> SampleBuffer {
        SampleBuffer::from_frames((0..n).map(|i| StereoFrame::mono(i as f32)).collect())
    }

    #[test]
    fn reversed_flips_frame_order() {
        let buf = ramp(4);
        let rev = buf.reversed();
        assert_eq!(rev.data[0].left, 3.0);
        assert_eq!(rev.data[3].left, 0.0);
        // source stays untouched
        assert_eq!(buf.data[0].left, 0.0);
    }

    #[test]
    fn duration_follows_sample_rate() {
        let buf = ramp(500);
        assert_eq!(buf.duration_secs(1000), 0.5);
        assert_eq!(buf.duration_secs(0), 0.0);
    }

    #[test]
    fn upsampling_doubles_length_and_interpolates() {
        let out = resample_linear(&ramp(4).data, 22050, 44100);
        assert_eq!(out.len(), 8);
        assert!((out[1].left - 0.5).abs() < 1e-6);
    }

    #[test]
    fn loads_mono_int_wav_as_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0i16, 16384, -16384, 0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let buf = SampleBuffer::load_wav(&path, 44100).unwrap();
        assert_eq!(buf.len(), 4);
        assert!((buf.data[1].left - 0.5).abs() < 1e-4);
        assert_eq!(buf.data[1].left, buf.data[1].right);
    }
}
