use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::audio_api::{AudioClock, AudioCommand, VoiceRequest, VoiceSink};
use crate::error::VoiceError;

pub mod engine;
mod frame;
mod sample_bank;
mod sample_buffer;
mod sample_id;
pub mod voice;

pub use engine::{Engine, EngineStats, StatsSnapshot, MAX_VOICES};
pub use frame::StereoFrame;
pub use sample_bank::SampleBank;
pub use sample_buffer::SampleBuffer;
pub use sample_id::{next_sample_id, SampleId};

const COMMAND_QUEUE: usize = 1024;
const SCRATCH_FRAMES: usize = 8192;

/// Cheap, cloneable view of the running engine.
///
/// This is what the scheduler talks to: it is the audio clock (frames rendered
/// divided by the sample rate) and the voice sink (a bounded queue drained at
/// the top of every audio callback).
#[derive(Clone)]
pub struct AudioPort {
    tx: Sender<AudioCommand>,
    frames: Arc<AtomicU64>,
    ready: Arc<AtomicBool>,
    sample_rate: u32,
    stats: Arc<EngineStats>,
}

impl AudioPort {
    pub fn send(&self, cmd: AudioCommand) -> Result<(), VoiceError> {
        self.tx.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => VoiceError::QueueFull,
            TrySendError::Disconnected(_) => VoiceError::Disconnected,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn set_master_gain(&self, gain: f32) {
        let _ = self.send(AudioCommand::SetMasterGain(gain));
    }

    pub fn panic(&self) {
        let _ = self.send(AudioCommand::Panic);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    // The clock only starts once the device has asked for its first block.
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_ready() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        true
    }
}

impl AudioClock for AudioPort {
    fn now(&self) -> Option<f64> {
        if !self.is_ready() || self.sample_rate == 0 {
            return None;
        }
        Some(self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64)
    }
}

impl VoiceSink for AudioPort {
    fn schedule(&self, voice: VoiceRequest) -> Result<(), VoiceError> {
        self.send(AudioCommand::Schedule(voice))
    }

    fn voices_stolen(&self) -> u64 {
        self.stats.voices_stolen.load(Ordering::Relaxed)
    }
}

/// Owns the output stream. Dropping it stops the device, and with it every
/// voice still playing.
pub struct AudioHandle {
    port: AudioPort,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn port(&self) -> AudioPort {
        self.port.clone()
    }
}

pub fn start_audio(master_gain: f32) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = Engine::new(sample_rate, master_gain);
            let frames = engine.clock();
            let stats = engine.stats();
            let ready = Arc::new(AtomicBool::new(false));

            let output_stream = build_output_stream_f32(
                &device,
                &config.into(),
                engine,
                rx,
                Arc::clone(&ready),
                channels,
            )?;
            output_stream.play().context("failed to play output stream")?;
            tracing::info!(sample_rate, channels, "audio output started");

            Ok(AudioHandle {
                port: AudioPort {
                    tx,
                    frames,
                    ready,
                    sample_rate,
                    stats,
                },
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: Engine,
    rx: Receiver<AudioCommand>,
    ready: Arc<AtomicBool>,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let err_fn = |err| tracing::error!("audio output stream error: {err}");
    let mut scratch: Vec<StereoFrame> = Vec::with_capacity(SCRATCH_FRAMES);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if channels == 2 {
                // interleaved stereo f32 has exactly the StereoFrame layout
                let frames: &mut [StereoFrame] = unsafe {
                    std::slice::from_raw_parts_mut(data.as_mut_ptr() as *mut StereoFrame, n_frames)
                };
                engine.render_block(frames);
            } else {
                scratch.clear();
                scratch.resize(n_frames, StereoFrame::zero());
                engine.render_block(&mut scratch);
                for (out, frame) in data.chunks_exact_mut(channels.max(1)).zip(scratch.iter()) {
                    if out.len() == 1 {
                        out[0] = 0.5 * (frame.left + frame.right);
                    } else {
                        out.fill(0.0);
                        out[0] = frame.left;
                        out[1] = frame.right;
                    }
                }
            }
            ready.store(true, Ordering::Release);
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
