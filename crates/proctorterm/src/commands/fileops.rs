//! File manipulation: cat, touch, mkdir, rm, cp, mv.

use async_trait::async_trait;

use super::{expand_args, CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::fs::fs_errors;
use crate::parser::ParsedCommand;

pub struct Cat;

#[async_trait]
impl CommandHandler for Cat {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.args.is_empty() {
            return Ok(CmdOutput::ok(stdin.unwrap_or("")));
        }
        let mut out = String::new();
        let mut exit_code = 0;
        for path in expand_args(cmd, ctx) {
            match ctx.fs.resolve(&path, &ctx.cwd) {
                Some(node) if node.is_dir() => {
                    out.push_str(&format!("cat: {}: Is a directory\n", path));
                    exit_code = 1;
                }
                Some(node) => out.push_str(node.content().unwrap_or_default()),
                None => {
                    out.push_str(&format!("cat: {}: No such file or directory\n", path));
                    exit_code = 1;
                }
            }
        }
        Ok(CmdOutput::with_code(out, exit_code))
    }
}

pub struct Touch;

#[async_trait]
impl CommandHandler for Touch {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.args.is_empty() {
            return Ok(CmdOutput::err("touch: missing file operand\n", 2));
        }
        for path in expand_args(cmd, ctx) {
            if let Err(e) = ctx.fs.touch(&path, &ctx.cwd) {
                return Ok(CmdOutput::err(
                    format!("touch: cannot touch '{}': {}\n", path, fs_errors::reason(&e)),
                    1,
                ));
            }
        }
        Ok(CmdOutput::ok(""))
    }
}

pub struct Mkdir;

#[async_trait]
impl CommandHandler for Mkdir {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.args.is_empty() {
            return Ok(CmdOutput::err("mkdir: missing operand\n", 2));
        }
        let recursive = cmd.flag("p");
        for path in expand_args(cmd, ctx) {
            if let Err(e) = ctx.fs.mkdir(&path, &ctx.cwd, recursive) {
                return Ok(CmdOutput::err(
                    format!(
                        "mkdir: cannot create directory '{}': {}\n",
                        path,
                        fs_errors::reason(&e)
                    ),
                    1,
                ));
            }
        }
        Ok(CmdOutput::ok(""))
    }
}

pub struct Rm;

#[async_trait]
impl CommandHandler for Rm {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.args.is_empty() {
            return Ok(CmdOutput::err("rm: missing operand\n", 2));
        }
        let recursive = cmd.flag("r") || cmd.flag("R");
        let force = cmd.flag("f");
        let mut out = String::new();
        let mut exit_code = 0;
        for path in expand_args(cmd, ctx) {
            let exists = ctx.fs.exists(&path, &ctx.cwd);
            match ctx.fs.rm(&path, &ctx.cwd, recursive) {
                Ok(()) => {}
                Err(_) if force && !exists => {
                    // -f suppresses not-found complaints.
                }
                Err(e) => {
                    out.push_str(&format!(
                        "rm: cannot remove '{}': {}\n",
                        path,
                        fs_errors::reason(&e)
                    ));
                    exit_code = 1;
                }
            }
        }
        Ok(CmdOutput::with_code(out, exit_code))
    }
}

pub struct Cp;

#[async_trait]
impl CommandHandler for Cp {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let args = expand_args(cmd, ctx);
        let [src, dst] = args.as_slice() else {
            return Ok(CmdOutput::err("cp: missing file operand\n", 2));
        };
        let recursive = cmd.flag("r") || cmd.flag("R");
        if ctx.fs.is_directory(src, &ctx.cwd) && !recursive {
            return Ok(CmdOutput::err(
                format!("cp: -r not specified; omitting directory '{}'\n", src),
                1,
            ));
        }
        match ctx.fs.copy(src, dst, &ctx.cwd) {
            Ok(()) => Ok(CmdOutput::ok("")),
            Err(e) => Ok(CmdOutput::err(
                format!("cp: cannot copy '{}': {}\n", src, fs_errors::reason(&e)),
                1,
            )),
        }
    }
}

pub struct Mv;

#[async_trait]
impl CommandHandler for Mv {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let args = expand_args(cmd, ctx);
        let [src, dst] = args.as_slice() else {
            return Ok(CmdOutput::err("mv: missing file operand\n", 2));
        };
        match ctx.fs.rename(src, dst, &ctx.cwd) {
            Ok(()) => Ok(CmdOutput::ok("")),
            Err(e) => Ok(CmdOutput::err(
                format!("mv: cannot move '{}': {}\n", src, fs_errors::reason(&e)),
                1,
            )),
        }
    }
}
