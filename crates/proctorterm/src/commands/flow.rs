//! true, false, exit.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

pub struct True;

#[async_trait]
impl CommandHandler for True {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        Ok(CmdOutput::ok(""))
    }
}

pub struct False;

#[async_trait]
impl CommandHandler for False {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        Ok(CmdOutput::err("", 1))
    }
}

pub struct Exit;

#[async_trait]
impl CommandHandler for Exit {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        // The sandbox has nowhere to go; report the goodbye and the code.
        let code = cmd
            .args
            .first()
            .and_then(|a| a.parse().ok())
            .unwrap_or(0);
        Ok(CmdOutput::with_code("logout\n", code))
    }
}
