//! Pipeline executor.
//!
//! Walks a parsed [`Pipeline`] left to right, consulting the operator before
//! each stage: `;` always runs, `&&` runs on success, `||` on failure, `|`
//! runs unconditionally and feeds the previous stage's output in as stdin
//! (consuming it). A stage skipped by `&&`/`||` leaves `last_exit_code`
//! untouched, which keeps the rest of its chain skipped until a `;` runs
//! something again.
//!
//! Redirection is applied at the stage that declares it: the stage's output
//! goes to the VFS (with a guaranteed trailing newline) and the empty string
//! flows on. A handler that returns `Err` is caught here and rendered as
//! `"<cmd>: internal error"` — the engine never aborts a session on a
//! handler fault.

use std::future::Future;
use std::pin::Pin;

use crate::commands::{CmdOutput, Registry};
use crate::context::CommandContext;
use crate::fs::fs_errors;
use crate::parser::{self, Operator, ParsedCommand, Pipeline};

/// Parse and execute one raw line.
pub async fn run_line(registry: &Registry, ctx: &mut CommandContext, line: &str) -> CmdOutput {
    let pipeline = parser::parse_line(line);
    run_pipeline(registry, ctx, &pipeline).await
}

/// Execute a parsed pipeline against the context.
pub async fn run_pipeline(
    registry: &Registry,
    ctx: &mut CommandContext,
    pipeline: &Pipeline,
) -> CmdOutput {
    let mut terminal = String::new();
    let mut pipe_input: Option<String> = None;
    let mut final_exit = ctx.last_exit_code;

    for (i, cmd) in pipeline.commands.iter().enumerate() {
        let should_run = if i == 0 {
            true
        } else {
            match pipeline.operators[i - 1] {
                Operator::Seq | Operator::Pipe => true,
                Operator::And => ctx.last_exit_code == 0,
                Operator::Or => ctx.last_exit_code != 0,
            }
        };
        let feeds_pipe = pipeline.operators.get(i) == Some(&Operator::Pipe);

        if !should_run {
            // Skipped stages contribute nothing downstream.
            pipe_input = None;
            continue;
        }

        let stdin = pipe_input.take();
        let mut result = run_command(registry, ctx, cmd, stdin.as_deref(), true).await;

        if let Some(redirect) = &cmd.output_redirect {
            let path = ctx.expand_path(&redirect.path);
            let mut content = std::mem::take(&mut result.output);
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            let written = if redirect.append {
                ctx.fs.append_file(&path, &ctx.cwd, &content)
            } else {
                ctx.fs.write_file(&path, &ctx.cwd, &content)
            };
            if let Err(e) = written {
                result = CmdOutput::err(
                    format!("{}: {}: {}\n", cmd.command, path, fs_errors::reason(&e)),
                    1,
                );
            }
        }

        ctx.last_exit_code = result.exit_code;
        final_exit = result.exit_code;
        if feeds_pipe {
            pipe_input = Some(result.output);
        } else {
            terminal.push_str(&result.output);
        }
    }

    CmdOutput::with_code(terminal, final_exit)
}

/// Whether a command token is a bare `VAR=value` assignment.
fn parse_assignment(command: &str) -> Option<(&str, &str)> {
    let (name, value) = command.split_once('=')?;
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some((name, value))
    } else {
        None
    }
}

/// Execute a single command: assignments, input redirection, registry
/// lookup, the one-level `xargs` re-dispatch, and the internal-error guard.
fn run_command<'a>(
    registry: &'a Registry,
    ctx: &'a mut CommandContext,
    cmd: &'a ParsedCommand,
    stdin: Option<&'a str>,
    allow_redispatch: bool,
) -> Pin<Box<dyn Future<Output = CmdOutput> + Send + 'a>> {
    Box::pin(async move {
        if cmd.is_empty() {
            return CmdOutput::ok("");
        }

        if let Some((name, value)) = parse_assignment(&cmd.command) {
            if cmd.args.is_empty() {
                ctx.env.insert(name.to_string(), value.to_string());
                return CmdOutput::ok("");
            }
        }

        // `< file` replaces any piped stdin.
        let mut stdin_data: Option<String> = None;
        if let Some(input) = &cmd.input_redirect {
            let path = ctx.expand_path(input);
            match ctx.fs.read_file(&path, &ctx.cwd) {
                Ok(content) => stdin_data = Some(content),
                Err(_) => {
                    return CmdOutput::err(
                        format!("{}: {}: No such file or directory\n", cmd.command, path),
                        1,
                    )
                }
            }
        }
        let stdin = stdin_data.as_deref().or(stdin);

        // `xargs sub args...` re-enters dispatch with stdin tokens appended.
        if allow_redispatch && cmd.command == "xargs" && !cmd.args.is_empty() {
            let mut tokens = cmd.arg_tokens.clone();
            tokens.extend(
                stdin
                    .unwrap_or("")
                    .split_whitespace()
                    .map(str::to_string),
            );
            let sub = parser::parse_command(&tokens);
            return run_command(registry, ctx, &sub, None, false).await;
        }

        let Some(handler) = registry.lookup(&cmd.command) else {
            return CmdOutput::err(format!("{}: command not found\n", cmd.command), 127);
        };
        match handler.execute(cmd, ctx, stdin).await {
            Ok(result) => result,
            Err(_) => CmdOutput::err(format!("{}: internal error\n", cmd.command), 1),
        }
    })
}
