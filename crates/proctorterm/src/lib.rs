//! proctorterm - Sandboxed shell emulator for proctored technical assessments
//!
//! A browser-resident terminal core: commands are parsed, piped and
//! redirected against an in-memory virtual filesystem and a catalogue of
//! simulated tools (git, docker, node/npm, curl, coreutils). Alongside
//! execution, every keystroke and output is recorded into a replayable
//! event stream from which integrity signals (paste bursts, typing
//! velocity, idle-then-burst patterns) are scored.
//!
//! # Example
//!
//! ```rust
//! use proctorterm::Terminal;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut term = Terminal::new();
//!     term.boot();
//!     let out = term.process_input("echo hello world | wc -w\r").await;
//!     assert!(out.contains("2\r\n"));
//! }
//! ```
//!
//! Hosts that drive the engine without a byte stream use
//! [`Terminal::execute_line`]; the recorded log feeds [`ReplayEngine`] and
//! [`analyze`] afterwards.

mod ansi;
mod challenge;
mod commands;
mod context;
mod editor;
mod engine;
mod error;
mod events;
mod executor;
mod fs;
mod integrity;
mod parser;
mod recorder;
mod replay;
mod sim;

pub use challenge::{
    ChallengeCatalog, ChallengeState, LevelSpec, ObjectiveEvaluator, ObjectiveRule, ObjectiveSpec,
    RegexEvaluator,
};
pub use commands::{CmdOutput, CommandHandler, Registry};
pub use context::{expand_vars, CommandContext};
pub use editor::{Completion, InputBuffer};
pub use engine::{CompletionProvider, OutputSink, ShellCompleter, Terminal};
pub use error::{Error, Result};
pub use events::{EventKind, KeyMeta, PasteDetection, SessionEvent};
pub use executor::{run_line, run_pipeline};
pub use fs::{FsNode, FsSnapshot, GrepMatch, NodeKind, SnapshotKind, Vfs};
pub use integrity::{
    analyze, derive_pattern, IntegrityFlag, IntegrityReport, Severity, TypingPattern,
};
pub use parser::{
    parse_command, parse_line, tokenize, FlagValue, Operator, OutputRedirect, ParsedCommand,
    Pipeline,
};
pub use recorder::{EventRecorder, EventSink, FLUSH_INTERVAL};
pub use replay::{ReplayEngine, ReplayState};
pub use sim::{CommitEntry, Container, ContainerStatus, DockerSimState, GitSimState, SimState};

use std::collections::HashMap;
use std::sync::Arc;

impl Terminal {
    /// Create a new TerminalBuilder for customised configuration.
    pub fn builder() -> TerminalBuilder {
        TerminalBuilder::default()
    }
}

/// Builder for customised [`Terminal`] configuration.
///
/// ```rust
/// use proctorterm::Terminal;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut term = Terminal::builder()
///     .user("jordan")
///     .hostname("assessment-7")
///     .env("NODE_ENV", "test")
///     .cwd("/tmp")
///     .build();
/// let out = term.execute_line("pwd").await;
/// assert_eq!(out.output, "/tmp\n");
/// # }
/// ```
#[derive(Default)]
pub struct TerminalBuilder {
    fs: Option<Vfs>,
    env: HashMap<String, String>,
    cwd: Option<String>,
    user: Option<String>,
    hostname: Option<String>,
    rank: Option<String>,
    catalog: Option<Arc<ChallengeCatalog>>,
    evaluator: Option<Box<dyn ObjectiveEvaluator>>,
    completer: Option<Box<dyn CompletionProvider>>,
    output_sink: Option<OutputSink>,
    registry: Option<Registry>,
}

impl TerminalBuilder {
    /// Use a custom filesystem.
    pub fn fs(mut self, fs: Vfs) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Load the filesystem from a host fixture snapshot.
    pub fn fixture(mut self, snapshot: &FsSnapshot) -> Result<Self> {
        self.fs = Some(Vfs::from_snapshot(snapshot)?);
        Ok(self)
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the initial working directory.
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the session user name (also updates `USER` and `HOME`).
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Seniority rank shown by the challenge `status` command.
    pub fn rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = Some(rank.into());
        self
    }

    /// Install the level/objective catalogue.
    pub fn catalog(mut self, catalog: Arc<ChallengeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Install the objective evaluator invoked after each command.
    pub fn evaluator(mut self, evaluator: Box<dyn ObjectiveEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Replace the default completion provider.
    pub fn completer(mut self, completer: Box<dyn CompletionProvider>) -> Self {
        self.completer = Some(completer);
        self
    }

    /// Install the per-write output sink.
    pub fn output_sink(mut self, sink: OutputSink) -> Self {
        self.output_sink = Some(sink);
        self
    }

    /// Replace the command registry wholesale.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the Terminal instance.
    pub fn build(self) -> Terminal {
        let mut ctx = CommandContext::new();
        if let Some(fs) = self.fs {
            ctx.fs = fs;
        }
        if let Some(user) = self.user {
            let home = format!("/home/{}", user);
            ctx.env.insert("USER".to_string(), user.clone());
            ctx.env.insert("HOME".to_string(), home.clone());
            if self.cwd.is_none() {
                ctx.cwd = home.clone();
                ctx.env.insert("PWD".to_string(), home.clone());
                let _ = ctx.fs.mkdir(&home, "/", true);
            }
            ctx.user = user;
        }
        if let Some(hostname) = self.hostname {
            ctx.hostname = hostname;
        }
        if let Some(cwd) = self.cwd {
            let _ = ctx.fs.mkdir(&cwd, "/", true);
            ctx.env.insert("PWD".to_string(), cwd.clone());
            ctx.cwd = cwd;
        }
        for (key, value) in self.env {
            ctx.env.insert(key, value);
        }
        if let Some(rank) = self.rank {
            ctx.challenge.rank = rank;
        }
        if let Some(catalog) = self.catalog {
            ctx.catalog = catalog;
        }

        let registry = self.registry.unwrap_or_default();
        Terminal::assemble(
            registry,
            ctx,
            self.evaluator,
            self.completer,
            self.output_sink,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_terminal_runs_commands() {
        let mut term = Terminal::new();
        let result = term.execute_line("echo hello").await;
        assert_eq!(result.output, "hello\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn builder_overrides_identity_and_env() {
        let mut term = Terminal::builder()
            .user("jordan")
            .hostname("box-9")
            .env("EXTRA", "42")
            .build();
        assert_eq!(term.execute_line("whoami").await.output, "jordan\n");
        assert_eq!(term.execute_line("hostname").await.output, "box-9\n");
        assert_eq!(term.execute_line("pwd").await.output, "/home/jordan\n");
        assert_eq!(term.execute_line("echo $EXTRA").await.output, "42\n");
        assert!(term.prompt().contains("jordan@box-9"));
    }

    #[tokio::test]
    async fn builder_accepts_custom_fs_and_cwd() {
        let mut fs = Vfs::new();
        fs.mkdir("/srv/app", "/", true).unwrap();
        fs.write_file("/srv/app/main.txt", "/", "content").unwrap();

        let mut term = Terminal::builder().fs(fs).cwd("/srv/app").build();
        assert_eq!(term.execute_line("cat main.txt").await.output, "content");
    }

    #[tokio::test]
    async fn builder_fixture_round_trip() {
        let mut fs = Vfs::new();
        fs.write_file("/etc/motd", "/", "welcome\n").unwrap();
        let snapshot = fs.to_snapshot();

        let mut term = Terminal::builder()
            .fixture(&snapshot)
            .unwrap()
            .build();
        assert_eq!(term.execute_line("cat /etc/motd").await.output, "welcome\n");
    }
}
