//! Replay determinism on the paused tokio clock (the mock-clock contract):
//! every recorded event re-delivers in order, with scheduled delays of
//! `min(gap / speed, 2000 / speed)` milliseconds.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use proctorterm::{EventKind, ReplayEngine, SessionEvent};
use tokio::time::Instant;

fn log(timestamps: &[u64]) -> Vec<SessionEvent> {
    timestamps
        .iter()
        .map(|&ts| {
            SessionEvent::new(
                ts,
                EventKind::Output {
                    content: format!("@{}", ts),
                },
            )
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn eight_x_speed_delivers_in_order_with_capped_delays() {
    // Gaps: 400 ms, 2000 ms, 33600 ms.
    // At 8x: 50 ms, 250 ms (exactly at the cap), 250 ms (capped).
    let events = log(&[0, 400, 2400, 36_000]);
    let replay = ReplayEngine::new(events.clone());
    replay.set_speed(8.0);

    let deliveries: Arc<Mutex<Vec<(u64, Instant)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&deliveries);
    replay.on_event(move |event| {
        sink.lock().unwrap().push((event.timestamp_ms, Instant::now()));
    });

    let start = Instant::now();
    replay.play();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let seen = deliveries.lock().unwrap();
    let order: Vec<u64> = seen.iter().map(|(ts, _)| *ts).collect();
    assert_eq!(order, vec![0, 400, 2400, 36_000]);

    let offsets: Vec<u64> = seen
        .iter()
        .map(|(_, at)| at.duration_since(start).as_millis() as u64)
        .collect();
    assert_eq!(offsets, vec![0, 50, 300, 550]);
    assert!(!replay.state().is_playing);
}

#[tokio::test(start_paused = true)]
async fn one_x_speed_preserves_short_gaps_exactly() {
    let events = log(&[0, 120, 300]);
    let replay = ReplayEngine::new(events);

    let deliveries: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&deliveries);
    replay.on_event(move |_| sink.lock().unwrap().push(Instant::now()));

    let start = Instant::now();
    replay.play();
    tokio::time::sleep(Duration::from_secs(2)).await;

    let offsets: Vec<u64> = deliveries
        .lock()
        .unwrap()
        .iter()
        .map(|at| at.duration_since(start).as_millis() as u64)
        .collect();
    assert_eq!(offsets, vec![0, 120, 300]);
}

#[tokio::test(start_paused = true)]
async fn seek_then_play_delivers_the_tail() {
    let events = log(&[0, 100, 200, 300]);
    let replay = ReplayEngine::new(events);

    let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    replay.on_event(move |event| sink.lock().unwrap().push(event.timestamp_ms));

    replay.seek_to(2);
    replay.play();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(*seen.lock().unwrap(), vec![200, 300]);
}

#[tokio::test(start_paused = true)]
async fn speed_change_mid_replay_reschedules() {
    let events = log(&[0, 1000, 2000]);
    let replay = ReplayEngine::new(events);

    let seen: Arc<Mutex<Vec<(u64, Instant)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    replay.on_event(move |event| {
        sink.lock().unwrap().push((event.timestamp_ms, Instant::now()));
    });

    let start = Instant::now();
    replay.play();
    // After the first two deliveries (0 ms and 1000 ms), crank the speed.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    replay.set_speed(10.0);
    tokio::time::sleep(Duration::from_secs(2)).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    let last_offset = seen[2].1.duration_since(start).as_millis() as u64;
    // The final gap of 1000 ms reschedules to 100 ms at 10x, measured from
    // the moment the speed changed.
    assert_eq!(last_offset, 1200);
}

#[tokio::test(start_paused = true)]
async fn duration_and_defensive_resort() {
    let mut events = log(&[500, 100, 300]);
    events.rotate_left(1);
    let replay = ReplayEngine::new(events);
    assert_eq!(replay.duration_ms(), 400);

    let seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    replay.on_event(move |event| sink.lock().unwrap().push(event.timestamp_ms));
    replay.play();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(*seen.lock().unwrap(), vec![100, 300, 500]);
}
