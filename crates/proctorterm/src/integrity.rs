//! Integrity scoring: typing-pattern derivation and weighted deductions.
//!
//! A pure function of the completed event log, run off-line after a session.
//! Keystroke cadence, paste counts and focus changes are distilled into a
//! [`TypingPattern`]; the flag table deducts from a starting score of 100.

use serde::Serialize;

use crate::events::{is_backspace_key, EventKind, SessionEvent};

const IDLE_GAP_MS: u64 = 10_000;
const IDLE_BURST_RUN: usize = 20;
const IDLE_BURST_GAP_MS: u64 = 100;
const HIGH_SPEED_WINDOW: usize = 50;
const HIGH_SPEED_WPM: f64 = 200.0;
const PERFECT_WINDOW: usize = 100;
const PERFECT_BACKSPACE_RATIO: f64 = 0.02;

/// Derived typing statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypingPattern {
    pub average_wpm: f64,
    pub max_wpm: f64,
    pub backspace_ratio: f64,
    pub idle_burst_count: usize,
    pub tab_away_count: usize,
    pub sustained_high_speed_segments: usize,
    pub perfect_code_segments: usize,
}

/// Severity of an integrity flag, with its score deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn deduction(self) -> i32 {
        match self {
            Severity::High => 30,
            Severity::Medium => 15,
            Severity::Low => 5,
        }
    }
}

/// One raised integrity flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityFlag {
    pub id: &'static str,
    pub severity: Severity,
    pub detail: String,
}

/// The full report: score, flags, and the derived pattern.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub score: i32,
    pub flags: Vec<IntegrityFlag>,
    pub pattern: TypingPattern,
    pub summary: &'static str,
}

/// Words-per-minute over `chars` characters in `span_ms`.
fn wpm(chars: usize, span_ms: u64) -> f64 {
    if span_ms == 0 {
        return 0.0;
    }
    let minutes = span_ms as f64 / 60_000.0;
    (chars as f64 / 5.0) / minutes
}

/// Derive the typing pattern from an event log.
pub fn derive_pattern(events: &[SessionEvent]) -> TypingPattern {
    let keys: Vec<&SessionEvent> = events.iter().filter(|e| e.is_key()).collect();
    let mut pattern = TypingPattern::default();

    pattern.tab_away_count = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::FocusChange { focused: false }))
        .count();

    if keys.is_empty() {
        return pattern;
    }

    let span = keys[keys.len() - 1].timestamp_ms - keys[0].timestamp_ms;
    pattern.average_wpm = wpm(keys.len(), span);

    // Max WPM over a 10-key sliding window.
    for window in keys.windows(10) {
        let span = window[9].timestamp_ms - window[0].timestamp_ms;
        if span > 0 {
            pattern.max_wpm = pattern.max_wpm.max(wpm(10, span));
        }
    }

    let backspaces = keys
        .iter()
        .filter(|e| e.key().is_some_and(is_backspace_key))
        .count();
    pattern.backspace_ratio = backspaces as f64 / keys.len() as f64;

    // Idle-then-burst: a gap ≥ 10 s followed immediately by ≥ 20 keys each
    // under 100 ms apart.
    for i in 1..keys.len() {
        if keys[i].timestamp_ms - keys[i - 1].timestamp_ms >= IDLE_GAP_MS {
            let mut run = 1;
            let mut j = i + 1;
            while j < keys.len() && keys[j].timestamp_ms - keys[j - 1].timestamp_ms < IDLE_BURST_GAP_MS
            {
                run += 1;
                j += 1;
            }
            if run >= IDLE_BURST_RUN {
                pattern.idle_burst_count += 1;
            }
        }
    }

    // Non-overlapping windows: advance by the window size on a hit.
    let mut i = 0;
    while i + HIGH_SPEED_WINDOW <= keys.len() {
        let window = &keys[i..i + HIGH_SPEED_WINDOW];
        let span = window[HIGH_SPEED_WINDOW - 1].timestamp_ms - window[0].timestamp_ms;
        if span > 0 && wpm(HIGH_SPEED_WINDOW, span) > HIGH_SPEED_WPM {
            pattern.sustained_high_speed_segments += 1;
            i += HIGH_SPEED_WINDOW;
        } else {
            i += 1;
        }
    }

    let mut i = 0;
    while i + PERFECT_WINDOW <= keys.len() {
        let window = &keys[i..i + PERFECT_WINDOW];
        let backspaces = window
            .iter()
            .filter(|e| e.key().is_some_and(is_backspace_key))
            .count();
        if (backspaces as f64 / PERFECT_WINDOW as f64) < PERFECT_BACKSPACE_RATIO {
            pattern.perfect_code_segments += 1;
            i += PERFECT_WINDOW;
        } else {
            i += 1;
        }
    }

    pattern
}

/// Score an event log: 100 minus the weighted deductions, clamped to
/// [0, 100].
pub fn analyze(events: &[SessionEvent]) -> IntegrityReport {
    let pattern = derive_pattern(events);
    let paste_count = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Paste { .. }))
        .count();

    let mut flags = Vec::new();
    if paste_count > 5 {
        flags.push(IntegrityFlag {
            id: "excessive_paste",
            severity: Severity::High,
            detail: format!("{} paste events", paste_count),
        });
    } else if paste_count > 2 {
        flags.push(IntegrityFlag {
            id: "moderate_paste",
            severity: Severity::Medium,
            detail: format!("{} paste events", paste_count),
        });
    }
    if pattern.sustained_high_speed_segments > 0 {
        flags.push(IntegrityFlag {
            id: "speed_anomaly",
            severity: Severity::Medium,
            detail: format!(
                "{} sustained windows above {} WPM",
                pattern.sustained_high_speed_segments, HIGH_SPEED_WPM
            ),
        });
    }
    if pattern.perfect_code_segments > 2 {
        flags.push(IntegrityFlag {
            id: "perfect_code",
            severity: Severity::Medium,
            detail: format!(
                "{} long stretches with almost no corrections",
                pattern.perfect_code_segments
            ),
        });
    }
    if pattern.idle_burst_count > 3 {
        flags.push(IntegrityFlag {
            id: "idle_burst",
            severity: Severity::Low,
            detail: format!("{} idle-then-burst patterns", pattern.idle_burst_count),
        });
    }
    if pattern.tab_away_count > 10 {
        flags.push(IntegrityFlag {
            id: "frequent_tab_away",
            severity: Severity::Low,
            detail: format!("{} focus losses", pattern.tab_away_count),
        });
    }

    let deducted: i32 = flags.iter().map(|f| f.severity.deduction()).sum();
    let score = (100 - deducted).clamp(0, 100);
    let summary = if score >= 90 {
        "Session shows consistent, organic typing behaviour."
    } else if score >= 70 {
        "Session is largely organic with a few anomalies worth a look."
    } else if score >= 50 {
        "Session shows several signals associated with external assistance."
    } else {
        "Session authenticity is doubtful; manual review recommended."
    };

    IntegrityReport {
        score,
        flags,
        pattern,
        summary,
    }
}
