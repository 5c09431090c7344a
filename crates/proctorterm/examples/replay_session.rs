//! Record a short session, replay it at 8x, then print the integrity
//! report.
//!
//! Run with: cargo run --example replay_session

use std::sync::{Arc, Mutex};
use std::time::Duration;

use proctorterm::{analyze, EventKind, ReplayEngine, Terminal};

#[tokio::main]
async fn main() {
    // Record: type a couple of commands keystroke by keystroke.
    let mut term = Terminal::new();
    term.boot();
    for line in ["ls /", "echo replay me"] {
        for c in line.chars() {
            term.process_input(&c.to_string()).await;
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        term.process_input("\r").await;
    }
    term.stop();
    let events = term.events();
    println!("recorded {} events", events.len());

    // Replay at 8x, counting deliveries.
    let replay = ReplayEngine::new(events.clone());
    replay.set_speed(8.0);
    let delivered = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&delivered);
    replay.on_event(move |event| {
        if let EventKind::Command { raw, exit_code } = &event.kind {
            println!("  [{} ms] $ {} (exit {})", event.timestamp_ms, raw, exit_code);
        }
        *counter.lock().unwrap() += 1;
    });
    replay.play();
    tokio::time::sleep(Duration::from_secs(3)).await;
    println!(
        "replayed {}/{} events in {} ms of session time",
        delivered.lock().unwrap(),
        events.len(),
        replay.duration_ms()
    );

    // Score the session.
    let report = analyze(&events);
    println!(
        "integrity: {} ({} flags) - {}",
        report.score,
        report.flags.len(),
        report.summary
    );
}
