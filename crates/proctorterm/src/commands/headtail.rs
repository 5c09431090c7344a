//! head and tail.
//!
//! Both respect `-n N` (separate or attached) and read stdin when no file
//! operand is given. Default count is 10 lines.

use async_trait::async_trait;

use super::{numeric_flag_value, CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

const DEFAULT_LINES: usize = 10;

enum End {
    Head,
    Tail,
}

async fn run(
    end: End,
    cmd: &ParsedCommand,
    ctx: &mut CommandContext,
    stdin: Option<&str>,
) -> Result<CmdOutput> {
    let name = match end {
        End::Head => "head",
        End::Tail => "tail",
    };
    let count = numeric_flag_value(cmd, 'n').unwrap_or(DEFAULT_LINES);
    // Positional operands minus the count value `-n` may have left behind.
    let file = cmd
        .args
        .iter()
        .find(|a| !a.chars().all(|c| c.is_ascii_digit()))
        .map(|a| ctx.expand_path(a));

    let content = match &file {
        Some(path) => match ctx.fs.read_file(path, &ctx.cwd) {
            Ok(content) => content,
            Err(_) => {
                return Ok(CmdOutput::err(
                    format!("{}: cannot open '{}' for reading: No such file or directory\n",
                        name, path),
                    1,
                ))
            }
        },
        None => stdin.unwrap_or("").to_string(),
    };

    let lines: Vec<&str> = content.lines().collect();
    let selected: Vec<&str> = match end {
        End::Head => lines.iter().take(count).copied().collect(),
        End::Tail => lines
            .iter()
            .skip(lines.len().saturating_sub(count))
            .copied()
            .collect(),
    };
    if selected.is_empty() {
        return Ok(CmdOutput::ok(""));
    }
    Ok(CmdOutput::ok(format!("{}\n", selected.join("\n"))))
}

pub struct Head;

#[async_trait]
impl CommandHandler for Head {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        run(End::Head, cmd, ctx, stdin).await
    }
}

pub struct Tail;

#[async_trait]
impl CommandHandler for Tail {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        run(End::Tail, cmd, ctx, stdin).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::testutil::run_with;

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line{}\n", i)).collect()
    }

    #[tokio::test]
    async fn head_default_ten() {
        let mut ctx = CommandContext::new();
        ctx.fs.write_file("/tmp/f", "/", &numbered(15)).unwrap();
        let out = run_with(&Head, "head /tmp/f", &mut ctx, None).await;
        assert_eq!(out.output.lines().count(), 10);
        assert!(out.output.starts_with("line1\n"));
        assert!(out.output.ends_with("line10\n"));
    }

    #[tokio::test]
    async fn head_n_flag_separate_and_attached() {
        let mut ctx = CommandContext::new();
        ctx.fs.write_file("/tmp/f", "/", &numbered(15)).unwrap();

        let separate = run_with(&Head, "head -n 3 /tmp/f", &mut ctx, None).await;
        assert_eq!(separate.output, "line1\nline2\nline3\n");

        let attached = run_with(&Head, "head -n3 /tmp/f", &mut ctx, None).await;
        assert_eq!(attached.output, "line1\nline2\nline3\n");
    }

    #[tokio::test]
    async fn tail_takes_last_lines() {
        let mut ctx = CommandContext::new();
        ctx.fs.write_file("/tmp/f", "/", &numbered(15)).unwrap();
        let out = run_with(&Tail, "tail -n 2 /tmp/f", &mut ctx, None).await;
        assert_eq!(out.output, "line14\nline15\n");
    }

    #[tokio::test]
    async fn stdin_when_no_file() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Head, "head -n 1", &mut ctx, Some("a\nb\nc\n")).await;
        assert_eq!(out.output, "a\n");

        let tail = run_with(&Tail, "tail -n 1", &mut ctx, Some("a\nb\nc\n")).await;
        assert_eq!(tail.output, "c\n");
    }

    #[tokio::test]
    async fn missing_file_is_error() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Head, "head /ghost", &mut ctx, None).await;
        assert_eq!(out.exit_code, 1);
        assert!(out.output.contains("cannot open"));
    }

    #[tokio::test]
    async fn tail_count_larger_than_file() {
        let mut ctx = CommandContext::new();
        ctx.fs.write_file("/tmp/f", "/", "only\n").unwrap();
        let out = run_with(&Tail, "tail -n 99 /tmp/f", &mut ctx, None).await;
        assert_eq!(out.output, "only\n");
    }
}
