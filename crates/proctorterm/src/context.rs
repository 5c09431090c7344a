//! Shared execution context.
//!
//! One [`CommandContext`] lives for the whole session. The engine owns it
//! exclusively; handlers borrow it mutably for the duration of a single
//! invocation, so no locking is needed on the cooperative thread.

use std::collections::HashMap;
use std::sync::Arc;

use crate::challenge::{ChallengeCatalog, ChallengeState};
use crate::fs::Vfs;
use crate::sim::SimState;

/// Default identity for a fresh assessment session.
pub const DEFAULT_USER: &str = "candidate";
pub const DEFAULT_HOSTNAME: &str = "fleetbox";

/// Mutable state shared across commands in a pipeline and between pipelines
/// within a session.
pub struct CommandContext {
    /// Absolute current working directory.
    pub cwd: String,
    pub env: HashMap<String, String>,
    pub fs: Vfs,
    pub last_exit_code: i32,
    pub user: String,
    pub hostname: String,
    pub challenge: ChallengeState,
    /// Per-session simulated tool state (git, docker).
    pub sim: SimState,
    /// Level/objective catalogue, supplied as data by the host.
    pub catalog: Arc<ChallengeCatalog>,
    /// Mirror of the line editor's history, refreshed by the engine before
    /// each execution so the `history` builtin stays a pure context reader.
    pub history: Vec<String>,
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandContext {
    pub fn new() -> Self {
        let home = format!("/home/{}", DEFAULT_USER);
        let mut env = HashMap::new();
        env.insert("HOME".to_string(), home.clone());
        env.insert("USER".to_string(), DEFAULT_USER.to_string());
        env.insert(
            "PATH".to_string(),
            "/usr/local/bin:/usr/bin:/bin".to_string(),
        );
        env.insert("SHELL".to_string(), "/bin/bash".to_string());
        env.insert("TERM".to_string(), "xterm-256color".to_string());
        env.insert("NODE_ENV".to_string(), "development".to_string());
        env.insert("PWD".to_string(), home.clone());

        Self {
            cwd: home,
            env,
            fs: Vfs::new(),
            last_exit_code: 0,
            user: DEFAULT_USER.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
            challenge: ChallengeState::default(),
            sim: SimState::default(),
            catalog: Arc::new(ChallengeCatalog::default()),
            history: Vec::new(),
        }
    }

    /// The user's home directory, from the environment.
    pub fn home(&self) -> String {
        self.env
            .get("HOME")
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }

    /// Expand `~` and `$VAR`/`${VAR}` in a path argument. Resolution of
    /// `.`/`..` stays with the filesystem.
    pub fn expand_path(&self, path: &str) -> String {
        let expanded = expand_vars(path, &self.env);
        if expanded == "~" {
            self.home()
        } else if let Some(rest) = expanded.strip_prefix("~/") {
            format!("{}/{}", self.home(), rest)
        } else {
            expanded
        }
    }

    /// The cwd abbreviated to `~` / `~/…` when inside `HOME`, for prompts.
    pub fn display_cwd(&self) -> String {
        let home = self.home();
        if self.cwd == home {
            "~".to_string()
        } else if let Some(rest) = self.cwd.strip_prefix(&format!("{}/", home)) {
            format!("~/{}", rest)
        } else {
            self.cwd.clone()
        }
    }
}

/// Substitute `$VAR` and `${VAR}` occurrences from `env`. Unset variables
/// expand to the empty string.
pub fn expand_vars(input: &str, env: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() {
            if chars[i + 1] == '{' {
                if let Some(close) = chars[i + 2..].iter().position(|&c| c == '}') {
                    let name: String = chars[i + 2..i + 2 + close].iter().collect();
                    out.push_str(env.get(&name).map(String::as_str).unwrap_or(""));
                    i += close + 3;
                    continue;
                }
            } else if chars[i + 1].is_ascii_alphabetic() || chars[i + 1] == '_' {
                let mut end = i + 1;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                let name: String = chars[i + 1..end].iter().collect();
                out.push_str(env.get(&name).map(String::as_str).unwrap_or(""));
                i = end;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
