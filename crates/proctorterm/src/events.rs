//! Session event records.
//!
//! Every observable moment of a session — keystrokes, pastes, command
//! completions, emitted output, focus changes — is a [`SessionEvent`] with a
//! millisecond timestamp. The variant set is a closed tagged union; the wire
//! form discriminates on a `type` string so the transport collaborator can
//! serialise the log as a JSON array without further mapping.

use serde::{Deserialize, Serialize};

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMeta {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyMeta {
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }
}

/// How a paste was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteDetection {
    /// The host widget reported a clipboard paste.
    ClipboardApi,
    /// Inferred from keystroke inter-arrival times.
    Burst,
    /// Clipboard paste that landed inside an active burst window.
    Both,
}

/// Event payload, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Key {
        key: String,
        #[serde(default)]
        meta: KeyMeta,
    },
    Paste {
        content: String,
        detected_by: PasteDetection,
    },
    Output {
        content: String,
    },
    Command {
        raw: String,
        exit_code: i32,
    },
    ObjectiveComplete {
        id: String,
    },
    LevelAdvance {
        level: u32,
    },
    HintUsed {
        id: String,
    },
    FocusChange {
        focused: bool,
    },
    Resize {
        cols: u16,
        rows: u16,
    },
}

/// A timestamped session event. Timestamps are milliseconds from session
/// start and monotonic non-decreasing within one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl SessionEvent {
    pub fn new(timestamp_ms: u64, kind: EventKind) -> Self {
        Self { timestamp_ms, kind }
    }

    pub fn is_key(&self) -> bool {
        matches!(self.kind, EventKind::Key { .. })
    }

    /// The key string of a key event.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Key { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Whether a recorded key string names a backspace: the literal control
/// codes 8 and 127 or the widget-level name `"Backspace"`.
pub fn is_backspace_key(key: &str) -> bool {
    if key == "Backspace" {
        return true;
    }
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c as u32 == 8 || c as u32 == 127,
        _ => false,
    }
}
