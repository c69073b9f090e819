//! Offline simulator for the LoopSync correction policy.
//!
//! Plays the three-band policy against a modeled looping player, cycle by
//! cycle, so thresholds and gain can be tuned without hardware: inject a
//! starting misalignment (and optionally per-cycle scheduling noise and seek
//! landing error) and watch how the controller would converge.

use anyhow::{bail, Result};
use clap::Parser;
use rand::Rng;
use tracing_subscriber::EnvFilter;

use loopsync_core::{policy, timeline, Correction, SyncConfig, NOMINAL_RATE};

#[derive(Parser, Debug)]
#[command(
    name = "loopsync-sim",
    about = "Simulate LoopSync drift correction against a modeled player"
)]
struct Args {
    /// Video duration in seconds
    #[arg(long, default_value_t = 8.0)]
    duration: f64,

    /// Misalignment at cycle zero, in seconds (positive = behind target)
    #[arg(long, default_value_t = 0.2)]
    start_drift: f64,

    /// Number of correction cycles to simulate
    #[arg(long, default_value_t = 30)]
    cycles: u32,

    /// Per-cycle position noise bound in seconds (scheduling/decode jitter)
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,

    /// Seconds a hard seek lands short of its target (decode latency)
    #[arg(long, default_value_t = 0.0)]
    seek_miss: f64,

    /// Drift-ignore threshold in seconds
    #[arg(long, default_value_t = 0.05)]
    drift_ignore: f64,

    /// Hard-seek threshold in seconds
    #[arg(long, default_value_t = 0.3)]
    drift_seek: f64,

    /// Proportional gain
    #[arg(long, default_value_t = 0.4)]
    gain: f64,

    /// Minimum playback rate
    #[arg(long, default_value_t = 0.97)]
    min_rate: f64,

    /// Maximum playback rate
    #[arg(long, default_value_t = 1.03)]
    max_rate: f64,

    /// Correction interval in milliseconds
    #[arg(long, default_value_t = 2000)]
    interval_ms: u64,

    /// Emit JSON lines instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if !args.duration.is_finite() || args.duration <= 0.0 {
        bail!("duration must be finite and positive, got {}", args.duration);
    }

    let config = SyncConfig {
        drift_ignore: args.drift_ignore,
        drift_seek: args.drift_seek,
        gain: args.gain,
        min_rate: args.min_rate,
        max_rate: args.max_rate,
        interval_ms: args.interval_ms,
        ..SyncConfig::default()
    };
    config.validate()?;
    tracing::debug!(?config, "simulating with");

    let interval = args.interval_ms as f64 / 1000.0;
    let mut rng = rand::thread_rng();

    // The modeled world: a wall clock and a player position on the loop.
    let mut now = 0.0_f64;
    let mut actual =
        (timeline::target_position(now, args.duration) - args.start_drift).rem_euclid(args.duration);
    let mut rate = NOMINAL_RATE;
    let mut seeks = 0u32;
    let mut converged_at: Option<u32> = None;

    if !args.json {
        println!("{:>5}  {:>9}  {:>6}  {}", "cycle", "drift", "rate", "action");
    }

    for cycle in 0..args.cycles {
        let drift = timeline::drift(now, actual, args.duration);
        let action = policy::plan(drift, rate, &config);
        match action {
            Correction::None => {}
            Correction::ResetRate => rate = NOMINAL_RATE,
            Correction::Rate(next) => rate = next,
            Correction::Seek => {
                rate = NOMINAL_RATE;
                actual = (timeline::target_position(now, args.duration) - args.seek_miss)
                    .rem_euclid(args.duration);
                seeks += 1;
            }
        }

        if args.json {
            println!(
                "{}",
                serde_json::json!({
                    "cycle": cycle,
                    "drift": drift,
                    "rate": rate,
                    "action": format!("{action:?}"),
                })
            );
        } else {
            println!("{cycle:>5}  {drift:>+9.4}  {rate:>6.3}  {action:?}");
        }

        if converged_at.is_none() && drift.abs() < config.drift_ignore {
            converged_at = Some(cycle);
        }

        // Advance the world one interval: the clock ticks, the player plays
        // at the current rate, and noise shifts the landed position.
        now += interval;
        let noise = if args.jitter > 0.0 {
            rng.gen_range(-args.jitter..=args.jitter)
        } else {
            0.0
        };
        actual = (actual + rate * interval + noise).rem_euclid(args.duration);
    }

    let final_drift = timeline::drift(now, actual, args.duration);
    eprintln!();
    match converged_at {
        Some(cycle) => eprintln!(
            "converged below {}s at cycle {cycle}; {seeks} hard seek(s); final drift {final_drift:+.4}s",
            config.drift_ignore
        ),
        None => eprintln!(
            "did not converge in {} cycles; {seeks} hard seek(s); final drift {final_drift:+.4}s",
            args.cycles
        ),
    }
    Ok(())
}
