//! Playback control: owns the scheduler thread and the transport state machine.
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info, warn};

use super::scheduler::Scheduler;
use super::transport::{ParamChange, PlayState, Transport, TransportParams};
use crate::audio::SampleBank;
use crate::audio_api::{AudioClock, VoiceSink};
use crate::config::{SequencerConfig, StopPolicy};
use crate::error::SequencerError;
use crate::pattern::PatternStore;
use crate::shared::{clamp_bpm, clamp_unit, StepIndex};

enum ControlMsg {
    Stop,
    Set(ParamChange),
}

struct Worker {
    tx: Sender<ControlMsg>,
    handle: JoinHandle<Transport>,
}

/// The control surface: start/stop, tempo, swing, direction, fill, and the
/// playhead for anyone drawing it.
pub struct Sequencer {
    config: SequencerConfig,
    clock: Arc<dyn AudioClock>,
    sink: Arc<dyn VoiceSink>,
    bank: Arc<SampleBank>,
    store: PatternStore,
    params: TransportParams,
    resume_step: StepIndex,
    current_step: Arc<AtomicU8>,
    playing: Arc<AtomicBool>,
    worker: Option<Worker>,
}

impl Sequencer {
    pub fn new(
        config: SequencerConfig,
        clock: Arc<dyn AudioClock>,
        sink: Arc<dyn VoiceSink>,
        bank: Arc<SampleBank>,
        store: PatternStore,
    ) -> Self {
        Self {
            config,
            clock,
            sink,
            bank,
            store,
            params: TransportParams::default(),
            resume_step: StepIndex::new(0),
            current_step: Arc::new(AtomicU8::new(0)),
            playing: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn pattern(&self) -> &PatternStore {
        &self.store
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn params(&self) -> TransportParams {
        self.params
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn play_state(&self) -> PlayState {
        if self.is_playing() { PlayState::Playing } else { PlayState::Stopped }
    }

    pub fn current_step(&self) -> usize {
        self.current_step.load(Ordering::Acquire) as usize
    }

    /// Shared view of the playhead, for observers living on other threads.
    pub fn step_observer(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.current_step)
    }

    pub fn start(&mut self) -> Result<(), SequencerError> {
        if self.worker.is_some() {
            debug!("start ignored, already playing");
            return Ok(());
        }
        let now = self.clock.now().ok_or(SequencerError::EngineNotReady)?;

        let transport = Transport::new(self.params, self.resume_step, now + self.config.start_lead_secs());
        let scheduler = Scheduler::new(&self.config, Arc::clone(&self.bank), Arc::clone(&self.sink));
        let (tx, rx) = crossbeam_channel::unbounded();

        let ctx = WorkerContext {
            clock: Arc::clone(&self.clock),
            store: self.store.clone(),
            current_step: Arc::clone(&self.current_step),
            tick: self.config.tick(),
        };
        let handle = thread::Builder::new()
            .name("ringseq-scheduler".into())
            .spawn(move || run_worker(transport, scheduler, rx, ctx))
            .map_err(SequencerError::Spawn)?;

        self.worker = Some(Worker { tx, handle });
        self.playing.store(true, Ordering::Release);
        info!(bpm = self.params.bpm, step = self.resume_step.get(), "playback started");
        Ok(())
    }

    // Voices already queued inside the look-ahead window still play out.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.tx.send(ControlMsg::Stop);
        let last_step = match worker.handle.join() {
            Ok(transport) => transport.current_step,
            Err(_) => {
                error!("scheduler thread panicked");
                StepIndex::new(0)
            }
        };

        self.resume_step = match self.config.stop_policy {
            StopPolicy::Reset => StepIndex::new(0),
            StopPolicy::Preserve => last_step,
        };
        if self.config.stop_policy == StopPolicy::Reset {
            self.current_step.store(0, Ordering::Release);
        }
        self.playing.store(false, Ordering::Release);
        info!(resume_step = self.resume_step.get(), "playback stopped");
    }

    pub fn toggle_play(&mut self) -> Result<(), SequencerError> {
        if self.worker.is_some() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    pub fn set_bpm(&mut self, bpm: f64) {
        self.set(ParamChange::Bpm(clamp_bpm(bpm)));
    }

    pub fn set_swing(&mut self, amount: f32) {
        self.set(ParamChange::Swing(clamp_unit(amount)));
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.set(ParamChange::Reverse(reverse));
    }

    pub fn set_fill(&mut self, fill: bool) {
        self.set(ParamChange::Fill(fill));
    }

    fn set(&mut self, change: ParamChange) {
        self.params.apply(change);
        if let Some(worker) = &self.worker {
            let _ = worker.tx.send(ControlMsg::Set(change));
        }
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WorkerContext {
    clock: Arc<dyn AudioClock>,
    store: PatternStore,
    current_step: Arc<AtomicU8>,
    tick: Duration,
}

// One pass per tick. Waiting for the next tick doubles as the control channel
// read, so stop and parameter changes land without polling.
fn run_worker(
    mut transport: Transport,
    mut scheduler: Scheduler,
    rx: Receiver<ControlMsg>,
    ctx: WorkerContext,
) -> Transport {
    let mut next_tick = Instant::now();
    let mut clock_lost = false;

    loop {
        match ctx.clock.now() {
            Some(now) => {
                if clock_lost {
                    info!("audio clock is back");
                    clock_lost = false;
                }
                let pattern = ctx.store.snapshot();
                let (next, report) = scheduler.run_pass(transport, &pattern, now);
                transport = next;
                if let Some(step) = report.last_step {
                    ctx.current_step.store(step.get() as u8, Ordering::Release);
                }
            }
            None => {
                if !clock_lost {
                    warn!("audio clock unavailable, skipping scheduling passes");
                    clock_lost = true;
                }
            }
        }

        next_tick += ctx.tick;
        let now = Instant::now();
        if next_tick < now {
            // fell behind; the next pass catches up on its own
            next_tick = now;
        }
        loop {
            match rx.recv_deadline(next_tick) {
                Ok(ControlMsg::Set(change)) => transport.params.apply(change),
                Ok(ControlMsg::Stop) | Err(RecvTimeoutError::Disconnected) => return transport,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ManualClock, RecordingSink};

    fn sequencer(clock: Arc<ManualClock>, config: SequencerConfig) -> Sequencer {
        Sequencer::new(
            config,
            clock,
            Arc::new(RecordingSink::new()),
            Arc::new(SampleBank::new()),
            PatternStore::default(),
        )
    }

    #[test]
    fn start_fails_without_clock() {
        let mut seq = sequencer(Arc::new(ManualClock::new()), SequencerConfig::default());
        assert!(matches!(seq.start(), Err(SequencerError::EngineNotReady)));
        assert!(!seq.is_playing());
        assert_eq!(seq.play_state(), PlayState::Stopped);
    }

    #[test]
    fn double_stop_is_harmless() {
        let mut seq = sequencer(Arc::new(ManualClock::running_at(0.0)), SequencerConfig::default());
        seq.start().unwrap();
        seq.stop();
        let after_one = (seq.is_playing(), seq.current_step(), seq.params());
        seq.stop();
        assert_eq!((seq.is_playing(), seq.current_step(), seq.params()), after_one);
    }

    #[test]
    fn setters_work_while_stopped() {
        let mut seq = sequencer(Arc::new(ManualClock::running_at(0.0)), SequencerConfig::default());
        seq.set_bpm(300.0);
        seq.set_swing(0.4);
        seq.set_reverse(true);
        seq.set_fill(true);
        let p = seq.params();
        assert_eq!(p.bpm, 200.0);
        assert_eq!(p.swing, 0.4);
        assert!(p.reverse && p.fill);
    }

    #[test]
    fn toggle_flips_between_playing_and_stopped() {
        let clock = Arc::new(ManualClock::running_at(0.0));
        let mut seq = sequencer(clock, SequencerConfig::default());
        seq.toggle_play().unwrap();
        assert_eq!(seq.play_state(), PlayState::Playing);
        seq.toggle_play().unwrap();
        assert_eq!(seq.play_state(), PlayState::Stopped);
    }

    #[test]
    fn observer_sees_the_dispatched_step() {
        let clock = Arc::new(ManualClock::running_at(0.0));
        let config = SequencerConfig { start_lead_ms: 0, ..SequencerConfig::default() };
        let mut seq = sequencer(Arc::clone(&clock), config);
        let observer = seq.step_observer();
        seq.start().unwrap();
        // window from t=0.3 reaches 0.4: steps 0..=3 are out
        clock.set(0.3);
        thread::sleep(Duration::from_millis(200));
        assert_eq!(observer.load(Ordering::Acquire), 3);
        seq.stop();
    }

    #[test]
    fn preserve_policy_resumes_where_it_stopped() {
        let clock = Arc::new(ManualClock::running_at(0.0));
        let config = SequencerConfig {
            stop_policy: StopPolicy::Preserve,
            start_lead_ms: 0,
            ..SequencerConfig::default()
        };
        let mut seq = sequencer(Arc::clone(&clock), config);
        seq.start().unwrap();
        // look-ahead from t=0.4 reaches 0.5, so steps 0..=3 go out
        clock.set(0.4);
        thread::sleep(Duration::from_millis(200));
        seq.stop();
        assert_eq!(seq.resume_step, StepIndex::new(4));
        assert_eq!(seq.current_step(), 3);
    }

    #[test]
    fn reset_policy_rewinds_the_playhead() {
        let clock = Arc::new(ManualClock::running_at(0.0));
        let config = SequencerConfig { start_lead_ms: 0, ..SequencerConfig::default() };
        let mut seq = sequencer(Arc::clone(&clock), config);
        seq.start().unwrap();
        clock.set(0.4);
        thread::sleep(Duration::from_millis(200));
        seq.stop();
        assert_eq!(seq.resume_step, StepIndex::new(0));
        assert_eq!(seq.current_step(), 0);
    }
}
