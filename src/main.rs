use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ringseq::loader::sample_loader;
use ringseq::pattern::persistence;
use ringseq::shared::STEPS_PER_TRACK;
use ringseq::{Pattern, PatternStore, SampleBank, Sequencer, SequencerConfig, Step, TrigCondition};

#[derive(Parser, Debug)]
#[command(name = "ringseq", version, about = "Circular multi-track step sequencer")]
struct Args {
    /// Directory with .wav samples; settings live in <dir>/.ringseq/
    #[arg(default_value = ".")]
    project_dir: PathBuf,

    /// Config file (defaults to <dir>/.ringseq/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pattern file (defaults to <dir>/.ringseq/pattern.json)
    #[arg(long)]
    pattern: Option<PathBuf>,

    #[arg(long)]
    bpm: Option<f64>,

    #[arg(long)]
    swing: Option<f32>,

    #[arg(long)]
    reverse: bool,

    #[arg(long)]
    fill: bool,

    /// Master output gain, 0.0..=1.0 (overrides the config)
    #[arg(long)]
    gain: Option<f32>,

    /// Silence every voice at stop instead of letting queued ones ring out
    #[arg(long)]
    cut: bool,

    /// How long to play before stopping
    #[arg(long, default_value_t = 8.0)]
    seconds: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| persistence::config_file_path(&args.project_dir));
    let config = if config_path.exists() {
        persistence::load_config(&config_path)?
    } else {
        // write the defaults out so there is a file to edit next time
        let config = SequencerConfig::default();
        persistence::save_config(&config_path, &config)?;
        tracing::info!("wrote default config to {}", config_path.display());
        config
    };

    let pattern_path = args
        .pattern
        .clone()
        .unwrap_or_else(|| persistence::pattern_file_path(&args.project_dir));
    let pattern = if pattern_path.exists() {
        persistence::load_pattern(&pattern_path)?
    } else {
        tracing::info!("no pattern at {}, using the demo beat", pattern_path.display());
        demo_pattern()
    };

    let audio = ringseq::start_audio(config.master_gain)?;
    let port = audio.port();
    if !port.wait_until_ready(Duration::from_secs(2)) {
        anyhow::bail!("audio device never started");
    }
    if let Some(gain) = args.gain {
        port.set_master_gain(gain);
    }

    let bank = Arc::new(SampleBank::new());
    let store = PatternStore::new(pattern);
    load_track_samples(&store, &bank, &args.project_dir, port.sample_rate())?;

    let port = Arc::new(port);
    let mut seq = Sequencer::new(config, port.clone(), port.clone(), Arc::clone(&bank), store);
    if let Some(bpm) = args.bpm {
        seq.set_bpm(bpm);
    }
    if let Some(swing) = args.swing {
        seq.set_swing(swing);
    }
    seq.set_reverse(args.reverse);
    seq.set_fill(args.fill);

    let playhead = seq.step_observer();
    seq.start().context("could not start playback")?;
    let started = Instant::now();
    let mut last_step = None;
    while started.elapsed().as_secs_f64() < args.seconds {
        let step = playhead.load(Ordering::Acquire) as usize;
        if last_step != Some(step) {
            println!("{}", ring_line(&seq.pattern().snapshot(), step));
            last_step = Some(step);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    seq.stop();

    if args.cut {
        port.panic();
    }
    // let the look-ahead tail ring out before the stream goes away
    std::thread::sleep(Duration::from_millis(seq.config().lookahead_ms + 200));
    let stats = port.stats();
    tracing::info!(
        started = stats.voices_started,
        finished = stats.voices_finished,
        forced = stats.voices_forced,
        stolen = stats.voices_stolen,
        "voice stats"
    );

    persistence::save_pattern(&pattern_path, &seq.pattern().snapshot())?;
    drop(seq);
    drop(audio);
    Ok(())
}

// Tracks with a sample_path that exists keep it; the others get the WAVs found
// in the project directory, in name order.
fn load_track_samples(
    store: &PatternStore,
    bank: &SampleBank,
    project_dir: &Path,
    sample_rate: u32,
) -> anyhow::Result<()> {
    let mut spare = sample_loader::index_wav_in_dir(project_dir)
        .unwrap_or_default()
        .into_iter();
    let pattern = store.snapshot();

    for (i, track) in pattern.tracks.iter().enumerate() {
        let saved = PathBuf::from(&track.sample_path);
        let path = if !track.sample_path.is_empty() && saved.exists() {
            saved
        } else if let Some(p) = spare.next() {
            p
        } else {
            tracing::warn!(track = i, "no sample available, track stays silent");
            continue;
        };

        match sample_loader::load_into_bank(bank, &path, sample_rate) {
            Ok(id) => {
                let sample_path = path.to_string_lossy().into_owned();
                store.assign_track_buffer(i, Some(id));
                store.edit(|p| {
                    if let Some(t) = p.track_mut(i) {
                        t.sample_path = sample_path.clone();
                    }
                });
                let secs = bank.get(id, false).map_or(0.0, |b| b.duration_secs(sample_rate));
                tracing::info!(track = i, path = %path.display(), secs, "sample assigned");
            }
            Err(e) => tracing::warn!(track = i, "could not load {}: {e:#}", path.display()),
        }
    }
    Ok(())
}

fn demo_pattern() -> Pattern {
    let mut pattern = Pattern::default();
    let on = Step { active: true, ..Step::default() };
    let hits: [&[usize]; 4] = [&[0, 4, 8, 12], &[4, 12], &[0, 2, 4, 6, 8, 10, 12, 14], &[14, 15]];

    for (track, steps) in pattern.tracks.iter_mut().zip(hits) {
        for &s in steps {
            track.steps[s] = on;
        }
    }
    // hats get a bit of variation, the last track only plays fills
    for s in pattern.tracks[2].steps.iter_mut().filter(|s| s.active) {
        s.probability = 0.8;
        s.gain = 0.6;
    }
    for s in pattern.tracks[3].steps.iter_mut().filter(|s| s.active) {
        s.condition = Some(TrigCondition::Fill);
    }
    pattern
}

fn ring_line(pattern: &Pattern, playhead: usize) -> String {
    let mut line = format!("{playhead:>2} ");
    for track in &pattern.tracks {
        line.push('|');
        for i in 0..STEPS_PER_TRACK {
            let c = match (i == playhead, track.steps[i].active) {
                (true, true) => '#',
                (true, false) => '^',
                (false, true) => 'x',
                (false, false) => '.',
            };
            line.push(c);
        }
    }
    line.push('|');
    line
}
