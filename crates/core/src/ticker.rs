//! Correction-cycle cadence sources
//!
//! The controller does not care where its cadence comes from, only that
//! ticks arrive no more often than the configured period. Two strategies
//! implement the contract: a plain timer, and a per-rendered-frame pulse
//! stream throttled to the same period. The frame strategy is preferred when
//! the environment exposes frame callbacks, because it naturally stops
//! ticking while the renderer is throttled.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Source of correction-cycle ticks. Implementations fire no more often
/// than their configured period.
#[async_trait]
pub trait TickSource: Send {
    /// Completes when the next correction cycle should run.
    async fn next_tick(&mut self);
}

/// Select a tick source for the environment's capabilities: frame pulses
/// when available, a plain interval otherwise.
pub fn for_environment(
    frame_pulses: Option<mpsc::Receiver<()>>,
    period: Duration,
) -> Box<dyn TickSource> {
    match frame_pulses {
        Some(pulses) => Box::new(FrameTicks::new(pulses, period)),
        None => Box::new(IntervalTicks::new(period)),
    }
}

/// Timer-driven cadence. The first tick fires one full period after
/// creation; missed ticks delay rather than burst, so spacing between
/// consecutive ticks never drops below the period.
pub struct IntervalTicks {
    inner: Interval,
}

impl IntervalTicks {
    /// Create a source ticking every `period`.
    pub fn new(period: Duration) -> Self {
        let mut inner = interval_at(Instant::now() + period, period);
        inner.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { inner }
    }
}

#[async_trait]
impl TickSource for IntervalTicks {
    async fn next_tick(&mut self) {
        self.inner.tick().await;
    }
}

/// Frame-callback-driven cadence: consumes per-rendered-frame pulses and
/// emits a tick when at least `period` has elapsed since the previous one.
/// Degrades to plain sleeping if the pulse source goes away.
pub struct FrameTicks {
    pulses: mpsc::Receiver<()>,
    period: Duration,
    last_tick: Option<Instant>,
}

impl FrameTicks {
    /// Create a source throttling `pulses` to one tick per `period`.
    pub fn new(pulses: mpsc::Receiver<()>, period: Duration) -> Self {
        Self {
            pulses,
            period,
            last_tick: None,
        }
    }
}

#[async_trait]
impl TickSource for FrameTicks {
    async fn next_tick(&mut self) {
        loop {
            match self.pulses.recv().await {
                Some(()) => {
                    let now = Instant::now();
                    let due = self
                        .last_tick
                        .map_or(true, |last| now.duration_since(last) >= self.period);
                    if due {
                        self.last_tick = Some(now);
                        return;
                    }
                }
                None => {
                    // Frame source gone: fall back to timer cadence.
                    tokio::time::sleep(self.period).await;
                    self.last_tick = Some(Instant::now());
                    return;
                }
            }
        }
    }
}
