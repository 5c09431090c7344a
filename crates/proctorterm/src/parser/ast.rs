//! Parsed command representation.

use std::collections::HashMap;

/// Value attached to a parsed flag: bare flags carry `Set`, `--flag=value`
/// and `--flag value` carry the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Set,
    Value(String),
}

/// Output redirection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub path: String,
    pub append: bool,
}

/// A single parsed command: name, positional args, flags, redirections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCommand {
    /// Command name; empty for a no-op segment.
    pub command: String,
    /// Positional arguments, in order.
    pub args: Vec<String>,
    /// Space-joined tail after the command name, pre flag/redirect parsing.
    pub raw_args: String,
    /// Parsed flags. Short flags coalesce: `-la` sets `l` and `a`.
    pub flags: HashMap<String, FlagValue>,
    /// `< path`
    pub input_redirect: Option<String>,
    /// `> path` / `>> path`
    pub output_redirect: Option<OutputRedirect>,
    /// The original token list after the command name, quotes already
    /// stripped. Handlers that need token-level access (`-n 5`, `-X POST`)
    /// read this instead of re-splitting `raw_args`.
    pub arg_tokens: Vec<String>,
}

impl ParsedCommand {
    /// A command with just a name, for tests and internal re-dispatch.
    pub fn named(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Whether `flag` was given, with or without a value.
    pub fn flag(&self, flag: &str) -> bool {
        self.flags.contains_key(flag)
    }

    /// The value of `flag`, if one was attached.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        match self.flags.get(flag) {
            Some(FlagValue::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Whether this segment is an empty no-op.
    pub fn is_empty(&self) -> bool {
        self.command.is_empty()
    }
}

/// Operator between two pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `|` — feed stdout to the next command's stdin.
    Pipe,
    /// `&&` — run next iff exit code 0.
    And,
    /// `||` — run next iff exit code non-zero.
    Or,
    /// `;` — run next unconditionally.
    Seq,
}

/// An operator-separated sequence of commands. Operator *i* sits between
/// commands *i* and *i+1*.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<ParsedCommand>,
    pub operators: Vec<Operator>,
}
