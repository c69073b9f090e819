//! LoopSync Core
//!
//! Keeps looping video playback on independent, clock-synchronized devices
//! aligned to a common wall-clock timeline without any network coordination:
//! each device derives its intended playback position solely from its local
//! wall clock and the video's duration.
//!
//! This crate provides:
//! - `timeline` - Pure clock-to-position mapping and wrap-adjusted drift
//! - `policy` - The three-band correction policy (none / rate nudge / seek)
//! - `SyncController` - Stateful controller owning one playback session
//! - `PlaybackElement` - Trait contract for the external media element
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use loopsync_core::{PlaybackElement, SyncConfig, SyncController, Visibility};
//!
//! # async fn demo(player: Arc<dyn PlaybackElement>) -> loopsync_core::Result<()> {
//! let (_visibility_tx, visibility_rx) = loopsync_core::visibility::channel(Visibility::Visible);
//! let handle = SyncController::attach(player, visibility_rx, SyncConfig::default())?;
//! // ... session runs in the background ...
//! handle.join().await;
//! # Ok(())
//! # }
//! ```
//!
//! `SyncController::attach` must be called from within a Tokio runtime; the
//! session runs on a single spawned task and is torn down via the returned
//! [`SyncHandle`].

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod player;
pub mod policy;
pub mod ticker;
pub mod timeline;
pub mod visibility;

pub use clock::{SystemClock, WallClock};
pub use config::SyncConfig;
pub use controller::{SyncController, SyncHandle, SyncState};
pub use error::{Error, Result};
pub use player::{PlaybackElement, PlayerEvent};
pub use policy::{Correction, NOMINAL_RATE};
pub use ticker::{FrameTicks, IntervalTicks, TickSource};
pub use visibility::Visibility;
