//! Chirp - sound-effect engine demo host
//!
//! Entry point and fixed-timestep game loop. This is the composition root:
//! it owns the `AudioEngine` and lends it to the game logic each tick.
//!
//! Usage: `chirp [config.json] [seconds]`

mod demo;

use anyhow::Result;
use chirp_audio::{AudioEngine, CpalDevice};
use chirp_core::{AudioConfig, FrameClock};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use demo::DemoScript;

const DEFAULT_RUN_SECONDS: f64 = 3.0;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Chirp starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next().map(PathBuf::from) {
        Some(path) => AudioConfig::load(&path)?,
        None => AudioConfig::default(),
    };
    let run_seconds = args
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(DEFAULT_RUN_SECONDS);

    // Audio failure is not fatal: the loop runs silently.
    let mut engine = match start_audio(&config) {
        Ok(engine) => Some(engine),
        Err(e) => {
            warn!("Audio unavailable, continuing without sound: {:#}", e);
            None
        }
    };

    let sample_rate = engine
        .as_ref()
        .map(AudioEngine::sample_rate)
        .unwrap_or(config.sample_rate);
    run_loop(&config, sample_rate, run_seconds, engine.as_mut());

    if let Some(engine) = engine {
        let stats = engine.stats();
        info!(
            "Audio stats: {} ticks, {} callbacks, {} underruns ({} samples), {} dropped",
            stats.ticks,
            stats.callbacks,
            stats.underruns,
            stats.underrun_samples,
            stats.dropped_samples
        );
        engine.shutdown();
    }

    info!("Chirp finished");
    Ok(())
}

fn start_audio(config: &AudioConfig) -> Result<AudioEngine> {
    let mut engine = AudioEngine::initialize(config, CpalDevice::new())?;
    engine.set_sound_bank(demo::demo_bank()?);
    engine.play_music(demo::demo_pattern());

    // Pre-fill one callback period so the first callback is not an underrun.
    engine.tick(engine.callback_buffer_size() as usize);
    engine.start()?;
    Ok(engine)
}

/// Fixed-timestep loop: audio first, then the frame's other work.
fn run_loop(
    config: &AudioConfig,
    sample_rate: u32,
    run_seconds: f64,
    mut engine: Option<&mut AudioEngine>,
) {
    let mut clock = FrameClock::new(sample_rate, config.target_fps);
    let mut script = DemoScript::new(clock.fps());
    let tick_period = Duration::from_secs_f64(clock.tick_seconds());
    let total_ticks = (run_seconds * clock.fps() as f64).ceil() as u64;

    let start = Instant::now();
    let mut deadline = start;
    for tick in 0..total_ticks {
        let frames = clock.next_frames();
        if let Some(engine) = engine.as_deref_mut() {
            engine.tick(frames);
        }

        script.update(tick, engine.as_deref_mut());

        deadline += tick_period;
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        } else {
            // Fell behind; resync rather than bursting to catch up.
            deadline = now;
        }
    }

    info!(
        "Ran {} ticks in {:.2}s (script finished: {})",
        clock.ticks(),
        start.elapsed().as_secs_f64(),
        script.finished()
    );
}
