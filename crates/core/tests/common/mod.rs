//! Scripted playback element and controllable wall clock for controller
//! integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use loopsync_core::{Error, PlaybackElement, PlayerEvent, Result, WallClock};

/// Every mutation the controller applies to the element, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Seek(f64),
    Rate(f64),
    Play,
    Pause,
}

#[derive(Debug)]
struct Inner {
    duration: Option<f64>,
    position: f64,
    rate: f64,
    paused: bool,
    deny_play: bool,
    /// Number of upcoming seeks that land `seek_miss` short of the request.
    seeks_landing_short: u32,
    seek_miss: f64,
    mutations: Vec<Mutation>,
}

pub struct FakePlayer {
    inner: Mutex<Inner>,
    events: broadcast::Sender<PlayerEvent>,
}

impl FakePlayer {
    pub fn new(duration: Option<f64>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            inner: Mutex::new(Inner {
                duration,
                position: 0.0,
                rate: 1.0,
                paused: true,
                deny_play: false,
                seeks_landing_short: 0,
                seek_miss: 0.0,
                mutations: Vec::new(),
            }),
            events,
        })
    }

    pub fn deny_play(&self) {
        self.inner.lock().unwrap().deny_play = true;
    }

    /// Make the next `count` seeks land `miss` seconds short of the request.
    pub fn land_seeks_short(&self, count: u32, miss: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.seeks_landing_short = count;
        inner.seek_miss = miss;
    }

    pub fn set_duration(&self, duration: Option<f64>) {
        self.inner.lock().unwrap().duration = duration;
    }

    pub fn set_position(&self, position: f64) {
        self.inner.lock().unwrap().position = position;
    }

    /// Silent pause (test scaffolding, not recorded as a mutation).
    pub fn force_paused(&self, paused: bool) {
        self.inner.lock().unwrap().paused = paused;
    }

    /// Silent rate write (test scaffolding, not recorded as a mutation).
    pub fn force_rate(&self, rate: f64) {
        self.inner.lock().unwrap().rate = rate;
    }

    pub fn current_rate(&self) -> f64 {
        self.inner.lock().unwrap().rate
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.inner.lock().unwrap().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.inner.lock().unwrap().mutations.clear();
    }

    pub fn announce_metadata(&self) {
        let _ = self.events.send(PlayerEvent::MetadataLoaded);
    }

    /// End of source: the element stops, as a real media element would.
    pub fn emit_ended(&self) {
        self.inner.lock().unwrap().paused = true;
        let _ = self.events.send(PlayerEvent::Ended);
    }
}

#[async_trait]
impl PlaybackElement for FakePlayer {
    fn duration(&self) -> Option<f64> {
        self.inner.lock().unwrap().duration
    }

    fn position(&self) -> f64 {
        self.inner.lock().unwrap().position
    }

    async fn seek(&self, position_secs: f64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.position = if inner.seeks_landing_short > 0 {
            inner.seeks_landing_short -= 1;
            position_secs - inner.seek_miss
        } else {
            position_secs
        };
        inner.mutations.push(Mutation::Seek(position_secs));
        Ok(())
    }

    fn rate(&self) -> f64 {
        self.inner.lock().unwrap().rate
    }

    fn set_rate(&self, rate: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.rate = rate;
        inner.mutations.push(Mutation::Rate(rate));
    }

    fn is_paused(&self) -> bool {
        self.inner.lock().unwrap().paused
    }

    async fn play(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.deny_play {
            return Err(Error::AutoplayBlocked);
        }
        inner.paused = false;
        inner.mutations.push(Mutation::Play);
        Ok(())
    }

    fn pause(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.paused = true;
        inner.mutations.push(Mutation::Pause);
    }

    fn events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }
}

/// Wall clock pinned to a settable epoch.
pub struct FakeClock(Mutex<f64>);

impl FakeClock {
    pub fn new(epoch_secs: f64) -> Arc<Self> {
        Arc::new(Self(Mutex::new(epoch_secs)))
    }

    pub fn set(&self, epoch_secs: f64) {
        *self.0.lock().unwrap() = epoch_secs;
    }
}

impl WallClock for FakeClock {
    fn now_secs(&self) -> f64 {
        *self.0.lock().unwrap()
    }
}
