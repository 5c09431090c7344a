//! Text filters: sort, uniq, xargs.
//!
//! Usage:
//!   sort [-r] [-n] [-u] [file]
//!   uniq [file]              # consecutive-duplicate removal only
//!   xargs [command]          # joins stdin tokens after the command
//!
//! `xargs` with a command is re-dispatched by the executor; the handler here
//! covers the bare form, which echoes the joined tokens.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

/// Read the single optional file operand, else fall back to stdin.
fn input_text(
    cmd: &ParsedCommand,
    ctx: &CommandContext,
    stdin: Option<&str>,
) -> std::result::Result<String, String> {
    match cmd.args.first() {
        Some(path) => {
            let path = ctx.expand_path(path);
            ctx.fs
                .read_file(&path, &ctx.cwd)
                .map_err(|_| format!("{}: No such file or directory", path))
        }
        None => Ok(stdin.unwrap_or("").to_string()),
    }
}

pub struct Sort;

#[async_trait]
impl CommandHandler for Sort {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let content = match input_text(cmd, ctx, stdin) {
            Ok(content) => content,
            Err(reason) => return Ok(CmdOutput::err(format!("sort: {}\n", reason), 1)),
        };
        let mut lines: Vec<&str> = content.lines().collect();

        if cmd.flag("n") {
            // Numeric: non-numbers sort as 0, ties stay stable.
            lines.sort_by(|a, b| {
                let na: f64 = a.trim().parse().unwrap_or(0.0);
                let nb: f64 = b.trim().parse().unwrap_or(0.0);
                na.partial_cmp(&nb).unwrap_or(std::cmp::Ordering::Equal)
            });
        } else {
            lines.sort();
        }
        if cmd.flag("r") {
            lines.reverse();
        }
        if cmd.flag("u") {
            lines.dedup();
        }
        if lines.is_empty() {
            return Ok(CmdOutput::ok(""));
        }
        Ok(CmdOutput::ok(format!("{}\n", lines.join("\n"))))
    }
}

pub struct Uniq;

#[async_trait]
impl CommandHandler for Uniq {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let content = match input_text(cmd, ctx, stdin) {
            Ok(content) => content,
            Err(reason) => return Ok(CmdOutput::err(format!("uniq: {}\n", reason), 1)),
        };
        let mut out = String::new();
        let mut previous: Option<&str> = None;
        for line in content.lines() {
            if previous != Some(line) {
                out.push_str(line);
                out.push('\n');
            }
            previous = Some(line);
        }
        Ok(CmdOutput::ok(out))
    }
}

pub struct Xargs;

#[async_trait]
impl CommandHandler for Xargs {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        // Bare xargs behaves like `echo` over its input tokens.
        let joined = stdin
            .unwrap_or("")
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ");
        if joined.is_empty() {
            return Ok(CmdOutput::ok(""));
        }
        Ok(CmdOutput::ok(format!("{}\n", joined)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::testutil::run_with;

    #[tokio::test]
    async fn sort_lexicographic() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Sort, "sort", &mut ctx, Some("pear\napple\nmango\n")).await;
        assert_eq!(out.output, "apple\nmango\npear\n");
    }

    #[tokio::test]
    async fn sort_reverse_numeric_unique() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Sort, "sort -n", &mut ctx, Some("10\n2\n33\n2\n")).await;
        assert_eq!(out.output, "2\n2\n10\n33\n");

        let rev = run_with(&Sort, "sort -rn", &mut ctx, Some("10\n2\n33\n")).await;
        assert_eq!(rev.output, "33\n10\n2\n");

        let uniq = run_with(&Sort, "sort -u", &mut ctx, Some("b\na\nb\n")).await;
        assert_eq!(uniq.output, "a\nb\n");
    }

    #[tokio::test]
    async fn sort_reads_file() {
        let mut ctx = CommandContext::new();
        ctx.fs.write_file("/tmp/f", "/", "c\na\nb\n").unwrap();
        let out = run_with(&Sort, "sort /tmp/f", &mut ctx, None).await;
        assert_eq!(out.output, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn uniq_collapses_consecutive_only() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Uniq, "uniq", &mut ctx, Some("a\na\nb\na\n")).await;
        assert_eq!(out.output, "a\nb\na\n");
    }

    #[tokio::test]
    async fn bare_xargs_joins_tokens() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Xargs, "xargs", &mut ctx, Some("a\nb  c\n")).await;
        assert_eq!(out.output, "a b c\n");
    }
}
