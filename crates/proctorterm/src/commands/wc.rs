//! wc - line, word and byte counts.
//!
//! `-l`/`-w`/`-c` select counts (combinable); with no flags all three print
//! in the standard `lines words bytes` order. Reads stdin when no file is
//! given.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

pub struct Wc;

fn counts(content: &str) -> (usize, usize, usize) {
    let lines = content.lines().count();
    let words = content.split_whitespace().count();
    let bytes = content.len();
    (lines, words, bytes)
}

#[async_trait]
impl CommandHandler for Wc {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let want_lines = cmd.flag("l");
        let want_words = cmd.flag("w");
        let want_bytes = cmd.flag("c");
        let want_all = !want_lines && !want_words && !want_bytes;

        let (content, label) = match cmd.args.first() {
            Some(path) => {
                let path = ctx.expand_path(path);
                match ctx.fs.read_file(&path, &ctx.cwd) {
                    Ok(content) => (content, Some(path)),
                    Err(_) => {
                        return Ok(CmdOutput::err(
                            format!("wc: {}: No such file or directory\n", path),
                            1,
                        ))
                    }
                }
            }
            None => (stdin.unwrap_or("").to_string(), None),
        };

        let (lines, words, bytes) = counts(&content);
        let mut fields = Vec::new();
        if want_lines || want_all {
            fields.push(lines.to_string());
        }
        if want_words || want_all {
            fields.push(words.to_string());
        }
        if want_bytes || want_all {
            fields.push(bytes.to_string());
        }
        let mut line = fields.join(" ");
        if let Some(name) = label {
            line.push(' ');
            line.push_str(&name);
        }
        Ok(CmdOutput::ok(format!("{}\n", line)))
    }
}
