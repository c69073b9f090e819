//! Playback element contract
//!
//! The controller treats the media element as a black box behind this trait.
//! It never decodes or renders; it only reads position/duration/pause state
//! and writes position and rate. Implementations wrap whatever the platform
//! provides (an HTML media element, a GStreamer pipeline, a test fake).

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::Result;

/// Lifecycle events delivered on the element's broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Duration and other metadata became readable.
    MetadataLoaded,
    /// Playback reached the end of the source. Fired once per loop when the
    /// element's native looping is disabled.
    Ended,
}

/// External media playback capability consumed by the controller.
///
/// The controller is the only writer of position and rate; at most one
/// controller may be attached to an element at a time.
#[async_trait]
pub trait PlaybackElement: Send + Sync {
    /// Media duration in seconds. `None` until metadata is available.
    /// Fixed for the lifetime of the source once loaded, but reads may
    /// transiently report `None` or garbage; callers guard every cycle.
    fn duration(&self) -> Option<f64>;

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Reposition to `position_secs`. Completes when the element has
    /// finished the reposition (the decode discontinuity is over).
    async fn seek(&self, position_secs: f64) -> Result<()>;

    /// Current playback rate (multiplicative, nominal 1.0).
    fn rate(&self) -> f64;

    /// Set the playback rate.
    fn set_rate(&self, rate: f64);

    /// Whether playback is currently paused.
    fn is_paused(&self) -> bool;

    /// Start playback. May fail with [`crate::Error::AutoplayBlocked`] when
    /// the environment denies autoplay; the controller swallows that.
    async fn play(&self) -> Result<()>;

    /// Pause playback.
    fn pause(&self);

    /// Subscribe to lifecycle events.
    fn events(&self) -> broadcast::Receiver<PlayerEvent>;
}
