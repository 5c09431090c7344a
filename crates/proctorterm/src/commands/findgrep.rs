//! find and grep.
//!
//! Usage:
//!   find [base] -name PATTERN
//!   grep [-r] [-i] PATTERN [file...]
//!
//! grep exit codes follow the real tool: 0 on any match, 1 on no match,
//! 2 on usage error. Multi-file and recursive output is colourised as
//! `file:line:content`.

use async_trait::async_trait;
use regex::RegexBuilder;

use super::{CmdOutput, CommandHandler};
use crate::ansi::{LINE_GREEN, MAGENTA, RESET};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

pub struct Find;

/// Pull the `-name PATTERN` value out of the raw token list; the coalescing
/// flag parser shreds `-name` into single letters.
fn name_pattern(cmd: &ParsedCommand) -> Option<String> {
    let mut tokens = cmd.arg_tokens.iter();
    while let Some(token) = tokens.next() {
        if token == "-name" {
            return tokens.next().cloned();
        }
    }
    None
}

#[async_trait]
impl CommandHandler for Find {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let base = cmd
            .args
            .iter()
            .find(|a| !a.starts_with('-'))
            .map(|a| ctx.expand_path(a))
            .unwrap_or_else(|| ".".to_string());
        let pattern = name_pattern(cmd).unwrap_or_else(|| "*".to_string());

        match ctx.fs.find(&base, &pattern, &ctx.cwd) {
            Ok(hits) if hits.is_empty() => Ok(CmdOutput::ok("")),
            Ok(hits) => Ok(CmdOutput::ok(format!("{}\n", hits.join("\n")))),
            Err(_) => Ok(CmdOutput::err(
                format!("find: '{}': No such file or directory\n", base),
                1,
            )),
        }
    }
}

pub struct Grep;

#[async_trait]
impl CommandHandler for Grep {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let recursive = cmd.flag("r") || cmd.flag("R");
        let ignore_case = cmd.flag("i");
        let Some(pattern) = cmd.args.first().cloned() else {
            return Ok(CmdOutput::err(
                "usage: grep [-r] [-i] PATTERN [FILE...]\n",
                2,
            ));
        };
        let files: Vec<String> = cmd.args[1..]
            .iter()
            .map(|a| ctx.expand_path(a))
            .collect();

        // No files: filter stdin.
        if files.is_empty() {
            let re = match RegexBuilder::new(&pattern)
                .case_insensitive(ignore_case)
                .build()
            {
                Ok(re) => re,
                Err(_) => {
                    return Ok(CmdOutput::err(
                        format!("grep: invalid pattern: {}\n", pattern),
                        2,
                    ))
                }
            };
            let mut out = String::new();
            for line in stdin.unwrap_or("").lines() {
                if re.is_match(line) {
                    out.push_str(line);
                    out.push('\n');
                }
            }
            let exit_code = if out.is_empty() { 1 } else { 0 };
            return Ok(CmdOutput::with_code(out, exit_code));
        }

        let multi = files.len() > 1 || recursive;
        let mut out = String::new();
        let mut matched = false;
        let mut exit_code = 1;
        for file in &files {
            let hits = match ctx.fs.grep(&pattern, file, &ctx.cwd, recursive, ignore_case) {
                Ok(hits) => hits,
                Err(crate::error::Error::Parse(_)) => {
                    return Ok(CmdOutput::err(
                        format!("grep: invalid pattern: {}\n", pattern),
                        2,
                    ))
                }
                Err(_) => {
                    out.push_str(&format!("grep: {}: No such file or directory\n", file));
                    exit_code = 2;
                    continue;
                }
            };
            for hit in hits {
                matched = true;
                if multi {
                    out.push_str(&format!(
                        "{}{}{}:{}{}{}:{}\n",
                        MAGENTA, hit.file, RESET, LINE_GREEN, hit.line, RESET, hit.text
                    ));
                } else {
                    out.push_str(&hit.text);
                    out.push('\n');
                }
            }
        }
        if matched {
            exit_code = 0;
        }
        Ok(CmdOutput::with_code(out, exit_code))
    }
}
