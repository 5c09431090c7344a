//! python / pip - scripted Python toolchain.
//!
//! Mirrors the node handler: `python -c` supports `print(…)` on string
//! literals and pure arithmetic; script files get pattern-matched canned
//! transcripts.

use async_trait::async_trait;

use super::node::{eval_arithmetic, render_number, unescape_literal};
use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

const PYTHON_VERSION: &str = "Python 3.11.7";
const PIP_VERSION: &str = "pip 23.3.2";

/// Extract output from `print("…")` / `print('…')` / `print(expr)`.
fn print_output(code: &str) -> Option<String> {
    let start = code.find("print(")? + "print(".len();
    let rest = &code[start..];
    let end = rest.rfind(')')?;
    let inner = rest[..end].trim();
    if (inner.starts_with('"') && inner.ends_with('"') && inner.len() >= 2)
        || (inner.starts_with('\'') && inner.ends_with('\'') && inner.len() >= 2)
    {
        return Some(unescape_literal(&inner[1..inner.len() - 1]));
    }
    eval_arithmetic(inner).map(render_number)
}

pub struct Python;

#[async_trait]
impl CommandHandler for Python {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.flag("version") || cmd.flag("V") {
            return Ok(CmdOutput::ok(format!("{}\n", PYTHON_VERSION)));
        }

        if cmd.flag("c") {
            let Some(code) = cmd.args.first() else {
                return Ok(CmdOutput::err(
                    "Argument expected for the -c option\n",
                    2,
                ));
            };
            if let Some(output) = print_output(code) {
                return Ok(CmdOutput::ok(format!("{}\n", output)));
            }
            if let Some(value) = eval_arithmetic(code) {
                return Ok(CmdOutput::ok(format!("{}\n", render_number(value))));
            }
            return Ok(CmdOutput::ok(""));
        }

        let Some(file) = cmd.args.first() else {
            return Ok(CmdOutput::ok(format!(
                "{} (sandbox)\nType \"help\" for more information.\n",
                PYTHON_VERSION
            )));
        };
        let path = ctx.expand_path(file);
        let Ok(source) = ctx.fs.read_file(&path, &ctx.cwd) else {
            return Ok(CmdOutput::err(
                format!(
                    "python: can't open file '{}': [Errno 2] No such file or directory\n",
                    path
                ),
                2,
            ));
        };

        if source.contains("pytest") || source.contains("def test_") {
            return Ok(CmdOutput::ok(
                "============================= test session starts ==============================\n\
                 collected 12 items\n\
                 \n\
                 tests/test_routes.py ............                                        [100%]\n\
                 \n\
                 ============================== 12 passed in 0.84s ==============================\n",
            ));
        }
        Ok(CmdOutput::ok(format!("[executed {}]\n", file)))
    }
}

pub struct Pip;

#[async_trait]
impl CommandHandler for Pip {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.flag("version") || cmd.flag("V") {
            return Ok(CmdOutput::ok(format!("{}\n", PIP_VERSION)));
        }
        match cmd.args.first().map(String::as_str) {
            Some("install") => {
                let packages = if cmd.args.len() > 1 {
                    cmd.args[1..].join(" ")
                } else {
                    "-r requirements.txt".to_string()
                };
                Ok(CmdOutput::ok(format!(
                    "Collecting {pkg}\n\
                     Installing collected packages: {pkg}\n\
                     Successfully installed {pkg}\n",
                    pkg = packages
                )))
            }
            Some("list") => Ok(CmdOutput::ok(
                "Package    Version\n---------- -------\npip        23.3.2\nrequests   2.31.0\n",
            )),
            Some(other) => Ok(CmdOutput::err(
                format!("ERROR: unknown command \"{}\"\n", other),
                1,
            )),
            None => Ok(CmdOutput::ok(
                "Usage:\n  pip <command> [options]\n\nCommands:\n  install    Install packages.\n  list       List installed packages.\n",
            )),
        }
    }
}
