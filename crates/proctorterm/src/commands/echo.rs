//! echo builtin command.
//!
//! Usage:
//!   echo [-n] [-e] args...
//!
//! Expands `$VAR` and `${VAR}` from the context environment. `-n` drops the
//! trailing newline, `-e` interprets backslash escapes.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::context::{expand_vars, CommandContext};
use crate::error::Result;
use crate::parser::ParsedCommand;

pub struct Echo;

#[async_trait]
impl CommandHandler for Echo {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let add_newline = !cmd.flag("n");
        let interpret_escapes = cmd.flag("e");

        let mut output = String::new();
        for (i, arg) in cmd.args.iter().enumerate() {
            if i > 0 {
                output.push(' ');
            }
            let expanded = expand_vars(arg, &ctx.env);
            if interpret_escapes {
                output.push_str(&interpret_escape_sequences(&expanded));
            } else {
                output.push_str(&expanded);
            }
        }
        if add_newline {
            output.push('\n');
        }
        Ok(CmdOutput::ok(output))
    }
}

fn interpret_escape_sequences(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('a') => result.push('\x07'),
                Some('b') => result.push('\x08'),
                Some('e') => result.push('\x1b'),
                Some('c') => break,
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::testutil::run_with;

    #[tokio::test]
    async fn echoes_args_with_newline() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Echo, "echo hello world", &mut ctx, None).await;
        assert_eq!(out.output, "hello world\n");
    }

    #[tokio::test]
    async fn dash_n_drops_newline() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Echo, "echo -n hi", &mut ctx, None).await;
        assert_eq!(out.output, "hi");
    }

    #[tokio::test]
    async fn expands_variables() {
        let mut ctx = CommandContext::new();
        ctx.env.insert("VAR".to_string(), "x".to_string());
        let out = run_with(&Echo, "echo $VAR", &mut ctx, None).await;
        assert_eq!(out.output, "x\n");

        let braced = run_with(&Echo, "echo ${VAR}y", &mut ctx, None).await;
        assert_eq!(braced.output, "xy\n");
    }

    #[tokio::test]
    async fn unset_variable_is_empty() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Echo, "echo $UNSET_THING", &mut ctx, None).await;
        assert_eq!(out.output, "\n");
    }

    #[tokio::test]
    async fn dash_e_interprets_escapes() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Echo, r"echo -e 'a\nb'", &mut ctx, None).await;
        assert_eq!(out.output, "a\nb\n");

        // Unquoted, the tokenizer consumes the backslash first.
        let unquoted = run_with(&Echo, r"echo -e a\nb", &mut ctx, None).await;
        assert_eq!(unquoted.output, "anb\n");
    }

    #[tokio::test]
    async fn quoted_arg_preserved() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Echo, "echo \"hello   world\"", &mut ctx, None).await;
        assert_eq!(out.output, "hello   world\n");
    }

    #[test]
    fn escape_sequences() {
        assert_eq!(interpret_escape_sequences("a\\tb"), "a\tb");
        assert_eq!(interpret_escape_sequences("x\\\\y"), "x\\y");
        assert_eq!(interpret_escape_sequences("stop\\chere"), "stop");
    }
}
