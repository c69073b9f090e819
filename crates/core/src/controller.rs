//! Drift-correction controller
//!
//! Owns the lifecycle of one playback session: initial alignment, the
//! periodic correction cycle, visibility-driven suspend/resume, end-of-loop
//! restart, and teardown. One Tokio task per session; every external signal
//! (tick cadence, visibility, player events, shutdown) is multiplexed
//! through `tokio::select!`, so correction cycles never overlap and entering
//! the suspended state cancels any scheduled resumption before it fires.
//!
//! Nothing on the periodic path propagates errors to the caller: every
//! failure degrades to "try again next cycle" or "do nothing this cycle".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::clock::{SystemClock, WallClock};
use crate::config::SyncConfig;
use crate::player::{PlaybackElement, PlayerEvent};
use crate::policy::{self, Correction, NOMINAL_RATE};
use crate::ticker::{self, TickSource};
use crate::timeline;
use crate::visibility::Visibility;
use crate::{Error, Result};

/// One rendering frame at 60 Hz. Waits shorter than this are resumed
/// immediately rather than scheduled, to avoid timer-granularity jitter.
const FRAME_SECS: f64 = 1.0 / 60.0;

/// Poll cadence while waiting for metadata when the element's event channel
/// is gone.
const METADATA_POLL: Duration = Duration::from_millis(100);

/// Correction state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Attached, session task not yet running.
    Uninitialized,
    /// Waiting for metadata and performing the first alignment.
    InitialSync,
    /// Periodic correction cycle running.
    SteadyState,
    /// Hosting context hidden; all corrective action withheld.
    Suspended,
    /// Torn down. Terminal.
    Stopped,
}

/// Entry point: attaches a controller to a playback element.
pub struct SyncController;

impl SyncController {
    /// Attach to `player` and begin syncing it to the wall clock.
    ///
    /// Spawns the session task on the current Tokio runtime and returns its
    /// teardown handle. The only error surfaced here is a rejected
    /// configuration.
    pub fn attach(
        player: Arc<dyn PlaybackElement>,
        visibility: watch::Receiver<Visibility>,
        config: SyncConfig,
    ) -> Result<SyncHandle> {
        config.validate()?;
        let ticks = ticker::for_environment(None, config.interval());
        Self::attach_with(player, visibility, config, Arc::new(SystemClock), ticks)
    }

    /// Attach using per-rendered-frame pulses as the correction cadence,
    /// throttled to the configured interval.
    pub fn attach_with_frame_source(
        player: Arc<dyn PlaybackElement>,
        visibility: watch::Receiver<Visibility>,
        config: SyncConfig,
        frame_pulses: mpsc::Receiver<()>,
    ) -> Result<SyncHandle> {
        config.validate()?;
        let ticks = ticker::for_environment(Some(frame_pulses), config.interval());
        Self::attach_with(player, visibility, config, Arc::new(SystemClock), ticks)
    }

    /// Attach with an explicit clock and tick source. Tests and the
    /// simulator use this to control time.
    pub fn attach_with(
        player: Arc<dyn PlaybackElement>,
        visibility: watch::Receiver<Visibility>,
        config: SyncConfig,
        clock: Arc<dyn WallClock>,
        ticks: Box<dyn TickSource>,
    ) -> Result<SyncHandle> {
        config.validate()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SyncState::Uninitialized);
        let events = player.events();
        let session = Session {
            player,
            clock,
            config,
            ticks,
            visibility,
            events,
            shutdown: shutdown_rx,
            state: state_tx,
            resume_deadline: None,
            events_closed: false,
            visibility_closed: false,
            halted: false,
        };
        let task = tokio::spawn(session.run());
        Ok(SyncHandle {
            shutdown: shutdown_tx,
            state: state_rx,
            task: Some(task),
        })
    }
}

/// Teardown handle for an attached session.
///
/// Dropping the handle stops the session.
pub struct SyncHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<SyncState>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Request teardown. Idempotent and safe from any state, including
    /// before initial sync completes; the session honors it at its next
    /// suspension point.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Current correction state, for diagnostics and tests.
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Stop the session and wait for its task to finish tearing down.
    pub async fn join(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the session task.
struct Session {
    player: Arc<dyn PlaybackElement>,
    clock: Arc<dyn WallClock>,
    config: SyncConfig,
    ticks: Box<dyn TickSource>,
    visibility: watch::Receiver<Visibility>,
    events: broadcast::Receiver<PlayerEvent>,
    shutdown: watch::Receiver<bool>,
    state: watch::Sender<SyncState>,
    /// Scheduled end-of-loop resumption, if any. Cleared when entering the
    /// suspended state so no stale resumption fires while hidden.
    resume_deadline: Option<Instant>,
    events_closed: bool,
    visibility_closed: bool,
    halted: bool,
}

impl Session {
    async fn run(mut self) {
        self.transition(SyncState::InitialSync);
        if !self.initial_sync().await {
            self.teardown();
            return;
        }

        // A session attached while hidden suspends before its first cycle.
        let hidden = *self.visibility.borrow() == Visibility::Hidden;
        if hidden {
            self.enter_suspended();
        } else {
            self.transition(SyncState::SteadyState);
        }

        while !self.stop_requested() {
            let state = *self.state.borrow();
            match state {
                SyncState::SteadyState => self.steady_tick().await,
                SyncState::Suspended => self.suspended_wait().await,
                _ => break,
            }
        }
        self.teardown();
    }

    /// One multiplexed step of the steady state.
    async fn steady_tick(&mut self) {
        let resume_at = self.resume_deadline.unwrap_or_else(Instant::now);
        let resume_armed = self.resume_deadline.is_some();
        tokio::select! {
            _ = self.ticks.next_tick() => {
                self.correction_cycle().await;
            }
            _ = tokio::time::sleep_until(resume_at), if resume_armed => {
                self.resume_deadline = None;
                self.start_playback().await;
            }
            event = self.events.recv(), if !self.events_closed => {
                match event {
                    Ok(PlayerEvent::Ended) => self.handle_ended().await,
                    Ok(PlayerEvent::MetadataLoaded) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "player event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        self.events_closed = true;
                    }
                }
            }
            changed = self.visibility.changed(), if !self.visibility_closed => {
                match changed {
                    Ok(()) => {
                        let now_hidden = *self.visibility.borrow() == Visibility::Hidden;
                        if now_hidden {
                            self.enter_suspended();
                        }
                    }
                    // Visibility source gone: stay visible.
                    Err(_) => self.visibility_closed = true,
                }
            }
            changed = self.shutdown.changed() => {
                if changed.is_err() {
                    self.halted = true;
                }
            }
        }
    }

    /// Wait for something actionable while hidden. No position or rate
    /// mutation can happen here: ticks are not polled and the resumption
    /// deadline was cleared on entry.
    async fn suspended_wait(&mut self) {
        tokio::select! {
            changed = self.visibility.changed(), if !self.visibility_closed => {
                match changed {
                    Ok(()) => {
                        let now_visible = *self.visibility.borrow() == Visibility::Visible;
                        if now_visible {
                            self.leave_suspended().await;
                        }
                    }
                    Err(_) => self.visibility_closed = true,
                }
            }
            event = self.events.recv(), if !self.events_closed => {
                // An Ended while hidden needs no action: resuming re-seeks.
                if let Err(broadcast::error::RecvError::Closed) = event {
                    self.events_closed = true;
                }
            }
            changed = self.shutdown.changed() => {
                if changed.is_err() {
                    self.halted = true;
                }
            }
        }
    }

    /// Initial alignment: wait for a usable duration, reposition once (a
    /// hard seek is invisible before the element has rendered), retry once
    /// if the seek landed out of tolerance, then start playback. Returns
    /// false if teardown was requested along the way.
    async fn initial_sync(&mut self) -> bool {
        let Some(duration) = self.wait_for_duration().await else {
            return false;
        };

        for attempt in 0..2u32 {
            let target = timeline::target_position(self.clock.now_secs(), duration);
            if let Err(error) = self.player.seek(target).await {
                warn!(%error, attempt, "initial reposition failed");
            }
            if self.stop_requested() {
                return false;
            }
            let drift = timeline::drift(self.clock.now_secs(), self.player.position(), duration);
            if drift.abs() <= self.config.drift_ignore {
                break;
            }
            if attempt == 0 {
                debug!(drift, "initial reposition landed out of tolerance, retrying once");
            }
            // After the retry, proceed regardless: perfect initial alignment
            // is best-effort and steady-state cycles converge the rest.
        }

        self.start_playback().await;
        !self.stop_requested()
    }

    /// Block until the element reports a finite, positive duration.
    async fn wait_for_duration(&mut self) -> Option<f64> {
        loop {
            if self.stop_requested() {
                return None;
            }
            if let Some(duration) = self.valid_duration() {
                return Some(duration);
            }
            tokio::select! {
                event = self.events.recv(), if !self.events_closed => {
                    if let Err(broadcast::error::RecvError::Closed) = event {
                        self.events_closed = true;
                    }
                }
                _ = tokio::time::sleep(METADATA_POLL), if self.events_closed => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        self.halted = true;
                    }
                }
            }
        }
    }

    /// One correction cycle: measure drift, dispatch the three-band policy.
    async fn correction_cycle(&mut self) {
        if self.player.is_paused() {
            // Paused is a deliberate suspension; don't fight it.
            return;
        }
        let Some(duration) = self.valid_duration() else {
            debug!("duration unreadable this cycle, skipping");
            return;
        };
        let drift = timeline::drift(self.clock.now_secs(), self.player.position(), duration);
        if !drift.is_finite() {
            debug!("position unreadable this cycle, skipping");
            return;
        }

        match policy::plan(drift, self.player.rate(), &self.config) {
            Correction::None => {
                trace!(drift, "drift negligible");
            }
            Correction::ResetRate => {
                debug!(drift, "drift negligible, restoring nominal rate");
                self.player.set_rate(NOMINAL_RATE);
            }
            Correction::Rate(rate) => {
                debug!(drift, rate, "gradual correction");
                self.player.set_rate(rate);
            }
            Correction::Seek => {
                let target = timeline::target_position(self.clock.now_secs(), duration);
                debug!(drift, target, "drift past hard threshold, repositioning");
                if (self.player.rate() - NOMINAL_RATE).abs() > f64::EPSILON {
                    self.player.set_rate(NOMINAL_RATE);
                }
                if let Err(error) = self.player.seek(target).await {
                    debug!(%error, "hard reposition failed, retrying next cycle");
                }
            }
        }
    }

    /// End of source reached: reposition to the start and schedule playback
    /// to resume exactly at the next wall-clock loop boundary.
    async fn handle_ended(&mut self) {
        let Some(duration) = self.valid_duration() else {
            return;
        };
        if let Err(error) = self.player.seek(0.0).await {
            debug!(%error, "rewind after ended failed");
        }
        if self.stop_requested() {
            return;
        }

        let mut wait = timeline::secs_until_boundary(self.clock.now_secs(), duration);
        if wait >= duration - FRAME_SECS {
            // Already past the boundary within one tick.
            wait = 0.0;
        }
        if wait < FRAME_SECS {
            self.start_playback().await;
        } else {
            debug!(wait, "holding at loop start until the next boundary");
            self.resume_deadline = Some(Instant::now() + Duration::from_secs_f64(wait));
        }
    }

    fn enter_suspended(&mut self) {
        // Cancel any scheduled loop restart before pausing so nothing fires
        // while hidden.
        self.resume_deadline = None;
        self.player.pause();
        self.transition(SyncState::Suspended);
    }

    /// Context visible again: there was no continuity to preserve, so a
    /// hard reposition is the right move before resuming.
    async fn leave_suspended(&mut self) {
        if let Some(duration) = self.valid_duration() {
            let target = timeline::target_position(self.clock.now_secs(), duration);
            if let Err(error) = self.player.seek(target).await {
                debug!(%error, "reposition on resume failed, next cycle corrects");
            }
        }
        if self.stop_requested() {
            return;
        }
        self.start_playback().await;
        self.transition(SyncState::SteadyState);
    }

    /// Start playback, absorbing autoplay denial.
    async fn start_playback(&mut self) {
        match self.player.play().await {
            Ok(()) => {}
            Err(Error::AutoplayBlocked) => {
                debug!("autoplay blocked, leaving element paused");
            }
            Err(error) => {
                warn!(%error, "playback start failed");
            }
        }
    }

    fn valid_duration(&self) -> Option<f64> {
        self.player
            .duration()
            .filter(|duration| duration.is_finite() && *duration > 0.0)
    }

    fn stop_requested(&self) -> bool {
        self.halted || *self.shutdown.borrow()
    }

    fn teardown(&mut self) {
        self.resume_deadline = None;
        if (self.player.rate() - NOMINAL_RATE).abs() > f64::EPSILON {
            self.player.set_rate(NOMINAL_RATE);
        }
        self.transition(SyncState::Stopped);
        // Event and visibility subscriptions drop with the session.
    }

    fn transition(&mut self, next: SyncState) {
        trace!(?next, "state transition");
        let _ = self.state.send(next);
    }
}
