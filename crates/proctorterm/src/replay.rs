//! Replay engine: deterministic playback of a recorded event log.
//!
//! Delivery is driven by a tokio timer task: each tick hands the current
//! event to `on_event`, advances the index, and schedules the next tick
//! after `gap / speed` milliseconds, capped at `2000 / speed` so long idle
//! stretches compress. Under tokio's paused test clock the schedule is fully
//! deterministic.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::events::SessionEvent;

/// Idle-gap cap numerator: at 1× speed no tick waits longer than this.
const MAX_TICK_MS: f64 = 2000.0;

/// Snapshot of playback state, handed to `on_state_change`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayState {
    pub index: usize,
    pub is_playing: bool,
    pub speed: f64,
}

type EventCallback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;
type StateCallback = Arc<dyn Fn(ReplayState) + Send + Sync>;

struct ReplayInner {
    events: Vec<SessionEvent>,
    index: usize,
    playing: bool,
    speed: f64,
    on_event: Option<EventCallback>,
    on_state: Option<StateCallback>,
    task: Option<JoinHandle<()>>,
}

impl ReplayInner {
    fn state(&self) -> ReplayState {
        ReplayState {
            index: self.index,
            is_playing: self.playing,
            speed: self.speed,
        }
    }
}

/// Deterministic playback over a recorded log with seek and variable speed.
pub struct ReplayEngine {
    inner: Arc<Mutex<ReplayInner>>,
}

impl ReplayEngine {
    /// Build a replay over `events`. The log is re-sorted by timestamp
    /// defensively; a correctly recorded log comes back unchanged.
    pub fn new(mut events: Vec<SessionEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp_ms);
        Self {
            inner: Arc::new(Mutex::new(ReplayInner {
                events,
                index: 0,
                playing: false,
                speed: 1.0,
                on_event: None,
                on_state: None,
                task: None,
            })),
        }
    }

    #[allow(clippy::unwrap_used)] // poisoned lock means a prior panic; propagate it
    fn lock(&self) -> MutexGuard<'_, ReplayInner> {
        self.inner.lock().unwrap()
    }

    /// Install the per-event delivery callback.
    pub fn on_event(&self, callback: impl Fn(&SessionEvent) + Send + Sync + 'static) {
        self.lock().on_event = Some(Arc::new(callback));
    }

    /// Install the state-change callback. It must not call back into the
    /// replay engine.
    pub fn on_state_change(&self, callback: impl Fn(ReplayState) + Send + Sync + 'static) {
        self.lock().on_state = Some(Arc::new(callback));
    }

    fn notify(&self) {
        let (callback, state) = {
            let inner = self.lock();
            (inner.on_state.clone(), inner.state())
        };
        if let Some(callback) = callback {
            callback(state);
        }
    }

    /// Resume playback from the current index, wrapping to the start when
    /// already at the end. Requires a tokio runtime.
    pub fn play(&self) {
        {
            let mut inner = self.lock();
            if inner.playing || inner.events.is_empty() {
                return;
            }
            if inner.index >= inner.events.len() {
                inner.index = 0;
            }
            inner.playing = true;
            let shared = Arc::clone(&self.inner);
            inner.task = Some(tokio::spawn(run_loop(shared, None)));
        }
        self.notify();
    }

    /// Cancel the pending tick and stop delivering.
    pub fn pause(&self) {
        {
            let mut inner = self.lock();
            if let Some(task) = inner.task.take() {
                task.abort();
            }
            inner.playing = false;
        }
        self.notify();
    }

    /// Change playback speed. While playing, the pending tick is
    /// re-scheduled at the new rate.
    pub fn set_speed(&self, speed: f64) {
        {
            let mut inner = self.lock();
            inner.speed = if speed > 0.0 { speed } else { 1.0 };
            if inner.playing {
                if let Some(task) = inner.task.take() {
                    task.abort();
                }
                // Recompute the pending tick's delay from the gap between
                // the last delivered event and the next one.
                let delay = match (
                    inner.index.checked_sub(1).and_then(|i| inner.events.get(i)),
                    inner.events.get(inner.index),
                ) {
                    (Some(prev), Some(next)) => {
                        let gap = next.timestamp_ms.saturating_sub(prev.timestamp_ms) as f64;
                        let ms = (gap / inner.speed).min(MAX_TICK_MS / inner.speed).max(0.0);
                        Some(Duration::from_micros((ms * 1000.0) as u64))
                    }
                    _ => None,
                };
                let shared = Arc::clone(&self.inner);
                inner.task = Some(tokio::spawn(run_loop(shared, delay)));
            }
        }
        self.notify();
    }

    /// Jump to an event index, clamped into range.
    pub fn seek_to(&self, index: usize) {
        {
            let mut inner = self.lock();
            inner.index = index.min(inner.events.len());
        }
        self.notify();
    }

    /// Jump to the event at `ms` from the start of the recording.
    pub fn seek_to_time(&self, ms: u64) {
        {
            let mut inner = self.lock();
            let first = inner.events.first().map(|e| e.timestamp_ms).unwrap_or(0);
            let target = first.saturating_add(ms);
            inner.index = inner.events.partition_point(|e| e.timestamp_ms < target);
        }
        self.notify();
    }

    /// Span between first and last event, in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        let inner = self.lock();
        match (inner.events.first(), inner.events.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0,
        }
    }

    pub fn state(&self) -> ReplayState {
        self.lock().state()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.lock().events.clone()
    }
}

impl Drop for ReplayEngine {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(task) = inner.task.take() {
                task.abort();
            }
        }
    }
}

async fn run_loop(shared: Arc<Mutex<ReplayInner>>, initial_delay: Option<Duration>) {
    if let Some(delay) = initial_delay {
        tokio::time::sleep(delay).await;
    }
    loop {
        let (event, callback, state_callback, delay) = {
            #[allow(clippy::unwrap_used)] // poisoned lock propagates the panic
            let mut inner = shared.lock().unwrap();
            if !inner.playing {
                return;
            }
            if inner.index >= inner.events.len() {
                inner.playing = false;
                inner.task = None;
                (None, None, inner.on_state.clone(), None)
            } else {
                let event = inner.events[inner.index].clone();
                inner.index += 1;
                let delay = inner.events.get(inner.index).map(|next| {
                    let gap = next.timestamp_ms.saturating_sub(event.timestamp_ms) as f64;
                    let ms = (gap / inner.speed).min(MAX_TICK_MS / inner.speed).max(0.0);
                    Duration::from_micros((ms * 1000.0) as u64)
                });
                (Some(event), inner.on_event.clone(), inner.on_state.clone(), delay)
            }
        };

        let Some(event) = event else {
            // Reached the end: report the stopped state.
            if let Some(callback) = state_callback {
                let state = {
                    #[allow(clippy::unwrap_used)]
                    let inner = shared.lock().unwrap();
                    inner.state()
                };
                callback(state);
            }
            return;
        };
        if let Some(callback) = callback {
            callback(&event);
        }
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => {
                // Delivered the final event.
                let state_callback = {
                    #[allow(clippy::unwrap_used)]
                    let mut inner = shared.lock().unwrap();
                    inner.playing = false;
                    inner.task = None;
                    inner.on_state.clone()
                };
                if let Some(callback) = state_callback {
                    let state = {
                        #[allow(clippy::unwrap_used)]
                        let inner = shared.lock().unwrap();
                        inner.state()
                    };
                    callback(state);
                }
                return;
            }
        }
    }
}
