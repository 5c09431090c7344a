//! env and export.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

pub struct Env;

#[async_trait]
impl CommandHandler for Env {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let mut pairs: Vec<(&String, &String)> = ctx.env.iter().collect();
        pairs.sort();
        let mut out = String::new();
        for (key, value) in pairs {
            out.push_str(&format!("{}={}\n", key, value));
        }
        Ok(CmdOutput::ok(out))
    }
}

pub struct Export;

#[async_trait]
impl CommandHandler for Export {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        // Bare `export` lists the environment, declare -x style.
        if cmd.args.is_empty() {
            let mut pairs: Vec<(&String, &String)> = ctx.env.iter().collect();
            pairs.sort();
            let mut out = String::new();
            for (key, value) in pairs {
                out.push_str(&format!("declare -x {}=\"{}\"\n", key, value));
            }
            return Ok(CmdOutput::ok(out));
        }

        for arg in &cmd.args {
            match arg.split_once('=') {
                Some((key, value)) => {
                    if !is_identifier(key) {
                        return Ok(CmdOutput::err(
                            format!("export: '{}': not a valid identifier\n", arg),
                            1,
                        ));
                    }
                    ctx.env.insert(key.to_string(), value.to_string());
                }
                None => {
                    if !is_identifier(arg) {
                        return Ok(CmdOutput::err(
                            format!("export: '{}': not a valid identifier\n", arg),
                            1,
                        ));
                    }
                    ctx.env.entry(arg.clone()).or_default();
                }
            }
        }
        Ok(CmdOutput::ok(""))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
