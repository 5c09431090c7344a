//! Challenge helpers: status, hint, submit, next-level.
//!
//! These read and mutate the challenge sub-record of the context against the
//! host-supplied catalogue. With an empty catalogue they degrade to a polite
//! "no assessment loaded" message.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::ansi::{GREEN, RESET, YELLOW};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

fn no_assessment() -> CmdOutput {
    CmdOutput::err("No assessment is loaded in this session.\n", 1)
}

pub struct Status;

#[async_trait]
impl CommandHandler for Status {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let catalog = ctx.catalog.clone();
        let Some(level) = catalog.level(ctx.challenge.level) else {
            return Ok(no_assessment());
        };
        let done = level
            .objectives
            .iter()
            .filter(|o| ctx.challenge.completed.contains(&o.id))
            .count();
        let mut out = format!(
            "{}Level {} — {}{}  [{}: {}/{} objectives]\n\n",
            YELLOW,
            level.level,
            level.title,
            RESET,
            ctx.challenge.rank,
            done,
            level.objectives.len()
        );
        for objective in &level.objectives {
            let mark = if ctx.challenge.completed.contains(&objective.id) {
                format!("{}[x]{}", GREEN, RESET)
            } else {
                "[ ]".to_string()
            };
            out.push_str(&format!("  {} {}  ({})\n", mark, objective.title, objective.id));
        }
        if !ctx.challenge.hints_used.is_empty() {
            out.push_str(&format!(
                "\nHints used: {}\n",
                ctx.challenge.hints_used.len()
            ));
        }
        Ok(CmdOutput::ok(out))
    }
}

pub struct Hint;

#[async_trait]
impl CommandHandler for Hint {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let catalog = ctx.catalog.clone();
        let Some(level) = catalog.level(ctx.challenge.level) else {
            return Ok(no_assessment());
        };
        let Some(next) = level
            .objectives
            .iter()
            .find(|o| !ctx.challenge.completed.contains(&o.id))
        else {
            return Ok(CmdOutput::ok(
                "All objectives complete — try 'next-level'.\n",
            ));
        };
        ctx.challenge.hints_used.insert(next.id.clone());
        Ok(CmdOutput::ok(format!(
            "{}Hint ({}):{} {}\n",
            YELLOW, next.id, RESET, next.hint
        )))
    }
}

pub struct Submit;

#[async_trait]
impl CommandHandler for Submit {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let catalog = ctx.catalog.clone();
        let Some(level) = catalog.level(ctx.challenge.level) else {
            return Ok(no_assessment());
        };
        let Some(id) = cmd.args.first() else {
            return Ok(CmdOutput::err("usage: submit <objective-id>\n", 2));
        };
        let Some(objective) = level.objectives.iter().find(|o| &o.id == id) else {
            return Ok(CmdOutput::err(
                format!("submit: unknown objective '{}' for level {}\n", id, level.level),
                1,
            ));
        };
        if !ctx.challenge.completed.insert(objective.id.clone()) {
            return Ok(CmdOutput::ok(format!(
                "Objective '{}' was already complete.\n",
                id
            )));
        }
        Ok(CmdOutput::ok(format!(
            "{}Objective complete:{} {}\n",
            GREEN, RESET, objective.title
        )))
    }
}

pub struct NextLevel;

#[async_trait]
impl CommandHandler for NextLevel {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let catalog = ctx.catalog.clone();
        let Some(level) = catalog.level(ctx.challenge.level) else {
            return Ok(no_assessment());
        };
        let missing: Vec<&str> = level
            .objectives
            .iter()
            .filter(|o| !ctx.challenge.completed.contains(&o.id))
            .map(|o| o.id.as_str())
            .collect();
        if !missing.is_empty() {
            return Ok(CmdOutput::err(
                format!(
                    "next-level: {} objective(s) remaining: {}\n",
                    missing.len(),
                    missing.join(", ")
                ),
                1,
            ));
        }
        if catalog.level(ctx.challenge.level + 1).is_none() {
            return Ok(CmdOutput::ok(
                "This was the final level. Assessment complete — well done.\n",
            ));
        }
        ctx.challenge.level += 1;
        let next = catalog
            .level(ctx.challenge.level)
            .map(|l| l.title.as_str())
            .unwrap_or("");
        Ok(CmdOutput::ok(format!(
            "{}Advancing to level {} — {}{}\n",
            YELLOW, ctx.challenge.level, next, RESET
        )))
    }
}
