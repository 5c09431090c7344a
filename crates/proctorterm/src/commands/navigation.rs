//! pwd and cd.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::fs::Vfs;
use crate::parser::ParsedCommand;

pub struct Pwd;

#[async_trait]
impl CommandHandler for Pwd {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        Ok(CmdOutput::ok(format!("{}\n", ctx.cwd)))
    }
}

pub struct Cd;

#[async_trait]
impl CommandHandler for Cd {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let mut echo_target = false;
        let target = match cmd.args.first().map(String::as_str) {
            None => ctx.home(),
            Some("-") => match ctx.env.get("OLDPWD") {
                Some(old) => {
                    // `cd -` prints the directory it lands in.
                    echo_target = true;
                    old.clone()
                }
                None => return Ok(CmdOutput::err("cd: OLDPWD not set\n", 1)),
            },
            Some(path) => ctx.expand_path(path),
        };

        let resolved = Vfs::resolve_path(&target, &ctx.cwd);
        match ctx.fs.resolve(&resolved, "/") {
            None => Ok(CmdOutput::err(
                format!("cd: no such file or directory: {}\n", target),
                1,
            )),
            Some(node) if !node.is_dir() => Ok(CmdOutput::err(
                format!("cd: not a directory: {}\n", target),
                1,
            )),
            Some(_) => {
                ctx.env.insert("OLDPWD".to_string(), ctx.cwd.clone());
                ctx.env.insert("PWD".to_string(), resolved.clone());
                ctx.cwd = resolved.clone();
                if echo_target {
                    Ok(CmdOutput::ok(format!("{}\n", resolved)))
                } else {
                    Ok(CmdOutput::ok(""))
                }
            }
        }
    }
}
