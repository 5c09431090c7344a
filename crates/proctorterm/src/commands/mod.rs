//! Command handlers for the simulated tool catalogue.
//!
//! Handlers are pure over their inputs plus the context they mutate: no I/O
//! outside the VFS, no blocking. Errors surface as `{output, exit_code}`
//! pairs — a handler returning `Err` is an internal fault the executor
//! converts to `"<cmd>: internal error"`.

mod challenge;
mod curl;
mod docker;
mod echo;
mod environ;
mod fileops;
mod filters;
mod findgrep;
mod flow;
mod git;
mod headtail;
mod ls;
mod navigation;
mod net;
mod node;
mod python;
mod registry;
mod system;
mod tree;
mod wc;

pub use registry::Registry;

use async_trait::async_trait;

use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

/// What a handler produced: the text to show (or pipe, or redirect) and the
/// exit code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CmdOutput {
    pub output: String,
    pub exit_code: i32,
}

impl CmdOutput {
    /// Successful result with the given output.
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            exit_code: 0,
        }
    }

    /// Failed result with an error message and exit code.
    pub fn err(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code,
        }
    }

    /// Result with output and a custom exit code.
    pub fn with_code(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            exit_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait implemented by every command in the registry.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput>;
}

/// Scan a command's tokens for `-<flag> N` or `-<flag>N` and parse the count.
/// Used by `head -n 5`, `tree -L 2` and friends, whose numeric values the
/// coalescing flag parser cannot carry.
pub(crate) fn numeric_flag_value(cmd: &ParsedCommand, flag: char) -> Option<usize> {
    let prefix = format!("-{}", flag);
    let mut tokens = cmd.arg_tokens.iter();
    while let Some(token) = tokens.next() {
        if token == &prefix {
            return tokens.next().and_then(|v| v.parse().ok());
        }
        if let Some(rest) = token.strip_prefix(&prefix) {
            if let Ok(n) = rest.parse() {
                return Some(n);
            }
        }
    }
    None
}

/// Positional operands with redirection tokens stripped, resolved against
/// the context for `~` and `$VAR`.
pub(crate) fn expand_args(cmd: &ParsedCommand, ctx: &CommandContext) -> Vec<String> {
    cmd.args.iter().map(|a| ctx.expand_path(a)).collect()
}
