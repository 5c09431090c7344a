//! Event recorder and burst-based paste detector.
//!
//! Append-only log of [`SessionEvent`]s with monotonic timestamps. A
//! periodic flush (every 5 seconds, a cancellable tokio task) drains newly
//! appended events through the installed sink; `flush()` drains immediately
//! and `stop()` flushes before cancelling the timer.
//!
//! Paste inference watches key-event inter-arrival times in a 5-second
//! sliding window: a trailing run of ≥ 30 gaps each ≤ 50 ms synthesises a
//! `paste` event with `detected_by = burst` and clears the window. A
//! clipboard paste that lands while the window is hot (mean of the last five
//! gaps under 50 ms) is classified `both`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::events::{EventKind, PasteDetection, SessionEvent};

/// Interval between automatic flushes.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

const BURST_WINDOW_MS: u64 = 5_000;
const BURST_GAP_MS: u64 = 50;
const BURST_MIN_RUN: usize = 30;

/// Callback receiving each newly flushed batch.
pub type EventSink = Box<dyn Fn(&[SessionEvent]) + Send + 'static>;

struct RecorderInner {
    events: Vec<SessionEvent>,
    flushed: usize,
    sink: Option<EventSink>,
    window: VecDeque<u64>,
    last_ts: u64,
}

impl RecorderInner {
    fn flush(&mut self) {
        if self.flushed >= self.events.len() {
            return;
        }
        if let Some(sink) = &self.sink {
            sink(&self.events[self.flushed..]);
        }
        self.flushed = self.events.len();
    }

    /// Length of the trailing run of gaps ≤ the burst threshold.
    fn trailing_run(&self) -> usize {
        let mut run = 0;
        let mut i = self.window.len();
        while i >= 2 && self.window[i - 1] - self.window[i - 2] <= BURST_GAP_MS {
            run += 1;
            i -= 1;
        }
        run
    }

    fn note_key(&mut self, ts: u64) -> Option<SessionEvent> {
        self.window.push_back(ts);
        while self
            .window
            .front()
            .is_some_and(|&front| front < ts.saturating_sub(BURST_WINDOW_MS))
        {
            self.window.pop_front();
        }
        if self.window.len() < BURST_MIN_RUN {
            return None;
        }
        let run = self.trailing_run();
        if run < BURST_MIN_RUN {
            return None;
        }
        let duration = ts - self.window[self.window.len() - 1 - run];
        self.window.clear();
        Some(SessionEvent::new(
            ts,
            EventKind::Paste {
                content: format!("[burst detected: {} chars in {}ms]", run, duration),
                detected_by: PasteDetection::Burst,
            },
        ))
    }

    /// Whether the burst window is currently hot: mean of the last 5 gaps
    /// under the threshold.
    fn window_hot(&self) -> bool {
        let len = self.window.len();
        if len < 6 {
            return false;
        }
        let span = self.window[len - 1] - self.window[len - 6];
        span / 5 < BURST_GAP_MS
    }
}

/// Append-only session event log with periodic flush.
pub struct EventRecorder {
    inner: Arc<Mutex<RecorderInner>>,
    epoch: Instant,
    flush_task: Option<JoinHandle<()>>,
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRecorder {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RecorderInner {
                events: Vec::new(),
                flushed: 0,
                sink: None,
                window: VecDeque::new(),
                last_ts: 0,
            })),
            epoch: Instant::now(),
            flush_task: None,
        }
    }

    /// Install the flush sink. Batches are slices of newly appended events.
    pub fn set_sink(&self, sink: EventSink) {
        self.lock().sink = Some(sink);
    }

    /// Start the periodic flush task. Requires a tokio runtime; calling
    /// twice is a no-op.
    pub fn start(&mut self) {
        if self.flush_task.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        self.flush_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(FLUSH_INTERVAL);
            interval.tick().await; // first tick is immediate
            loop {
                interval.tick().await;
                if let Ok(mut guard) = inner.lock() {
                    guard.flush();
                }
            }
        }));
    }

    /// Milliseconds since the recorder was created. Under tokio's paused
    /// test clock this follows the mocked time.
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    #[allow(clippy::unwrap_used)] // poisoned lock means a prior panic; propagate it
    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderInner> {
        self.inner.lock().unwrap()
    }

    /// Append an event stamped with the current time.
    pub fn record(&self, kind: EventKind) {
        self.record_at(self.now_ms(), kind);
    }

    /// Append an event at an explicit timestamp. Timestamps are clamped to
    /// be monotonic non-decreasing.
    pub fn record_at(&self, timestamp_ms: u64, kind: EventKind) {
        let mut inner = self.lock();
        let ts = timestamp_ms.max(inner.last_ts);
        let is_key = matches!(kind, EventKind::Key { .. });
        inner.events.push(SessionEvent::new(ts, kind));
        inner.last_ts = ts;
        if is_key {
            if let Some(burst) = inner.note_key(ts) {
                inner.events.push(burst);
            }
        }
    }

    /// How a clipboard-API paste arriving now should be classified.
    pub fn classify_clipboard_paste(&self) -> PasteDetection {
        if self.lock().window_hot() {
            PasteDetection::Both
        } else {
            PasteDetection::ClipboardApi
        }
    }

    /// Snapshot copy of the log.
    pub fn get_events(&self) -> Vec<SessionEvent> {
        self.lock().events.clone()
    }

    /// Drain unflushed events through the sink immediately.
    pub fn flush(&self) {
        self.lock().flush();
    }

    /// Cancel the flush timer and drain whatever is pending.
    pub fn stop(&mut self) {
        if let Some(task) = self.flush_task.take() {
            task.abort();
        }
        self.flush();
    }
}

impl Drop for EventRecorder {
    fn drop(&mut self) {
        if let Some(task) = self.flush_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::KeyMeta;

    fn key(recorder: &EventRecorder, ts: u64) {
        recorder.record_at(
            ts,
            EventKind::Key {
                key: "a".to_string(),
                meta: KeyMeta::default(),
            },
        );
    }

    #[test]
    fn timestamps_are_monotonic() {
        let recorder = EventRecorder::new();
        recorder.record_at(100, EventKind::Output { content: "a".into() });
        recorder.record_at(50, EventKind::Output { content: "b".into() });
        let events = recorder.get_events();
        assert_eq!(events[0].timestamp_ms, 100);
        assert_eq!(events[1].timestamp_ms, 100);

        let mut sorted = events.clone();
        sorted.sort_by_key(|e| e.timestamp_ms);
        assert_eq!(sorted, events);
    }

    #[test]
    fn burst_synthesises_one_paste_for_35_fast_keys() {
        let recorder = EventRecorder::new();
        for i in 0..35u64 {
            key(&recorder, i * 20);
        }
        let events = recorder.get_events();
        let pastes: Vec<&SessionEvent> = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Paste { .. }))
            .collect();
        assert_eq!(pastes.len(), 1);
        let EventKind::Paste {
            content,
            detected_by,
        } = &pastes[0].kind
        else {
            unreachable!()
        };
        assert_eq!(*detected_by, PasteDetection::Burst);
        assert_eq!(content, "[burst detected: 30 chars in 600ms]");
    }

    #[test]
    fn slow_typing_never_bursts() {
        let recorder = EventRecorder::new();
        for i in 0..60u64 {
            key(&recorder, i * 120);
        }
        assert!(!recorder
            .get_events()
            .iter()
            .any(|e| matches!(e.kind, EventKind::Paste { .. })));
    }

    #[test]
    fn gap_resets_the_run() {
        let recorder = EventRecorder::new();
        for i in 0..20u64 {
            key(&recorder, i * 20);
        }
        // A pause breaks the run; the next fast run restarts the count.
        key(&recorder, 20 * 20 + 2000);
        for i in 0..25u64 {
            key(&recorder, 2400 + 20 * 20 + i * 20);
        }
        assert!(!recorder
            .get_events()
            .iter()
            .any(|e| matches!(e.kind, EventKind::Paste { .. })));
    }

    #[test]
    fn clipboard_classification_follows_window_heat() {
        let recorder = EventRecorder::new();
        assert_eq!(
            recorder.classify_clipboard_paste(),
            PasteDetection::ClipboardApi
        );
        for i in 0..10u64 {
            key(&recorder, i * 10);
        }
        assert_eq!(recorder.classify_clipboard_paste(), PasteDetection::Both);
    }

    #[test]
    fn manual_flush_delivers_pending_batches() {
        let recorder = EventRecorder::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        recorder.set_sink(Box::new(move |batch| {
            sink_seen.lock().unwrap().extend_from_slice(batch);
        }));

        recorder.record_at(1, EventKind::Output { content: "x".into() });
        recorder.record_at(2, EventKind::Output { content: "y".into() });
        recorder.flush();
        assert_eq!(seen.lock().unwrap().len(), 2);

        // Flushing again without new events delivers nothing new.
        recorder.flush();
        assert_eq!(seen.lock().unwrap().len(), 2);

        recorder.record_at(3, EventKind::Output { content: "z".into() });
        recorder.flush();
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_flush_fires_every_five_seconds() {
        let mut recorder = EventRecorder::new();
        let seen = Arc::new(Mutex::new(0usize));
        let sink_seen = Arc::clone(&seen);
        recorder.set_sink(Box::new(move |batch| {
            *sink_seen.lock().unwrap() += batch.len();
        }));
        recorder.start();

        recorder.record_at(1, EventKind::Output { content: "x".into() });
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(*seen.lock().unwrap(), 1);

        recorder.record_at(2, EventKind::Output { content: "y".into() });
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(*seen.lock().unwrap(), 2);

        recorder.stop();
        recorder.record_at(3, EventKind::Output { content: "z".into() });
        recorder.flush();
        assert_eq!(*seen.lock().unwrap(), 3);
    }
}
