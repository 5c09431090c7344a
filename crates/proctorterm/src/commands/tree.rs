//! tree - directory tree rendering.
//!
//! Usage:
//!   tree [path]
//!   tree -L 2     # limit depth (default 4)

use async_trait::async_trait;

use super::{numeric_flag_value, CmdOutput, CommandHandler};
use crate::ansi::{BLUE, RESET};
use crate::context::CommandContext;
use crate::error::Result;
use crate::fs::FsNode;
use crate::parser::ParsedCommand;

const DEFAULT_DEPTH: usize = 4;

pub struct Tree;

struct Totals {
    dirs: usize,
    files: usize,
}

fn walk(node: &FsNode, prefix: &str, depth: usize, out: &mut String, totals: &mut Totals) {
    if depth == 0 {
        return;
    }
    let Some(children) = node.children() else {
        return;
    };
    let last_index = children.len().saturating_sub(1);
    for (i, child) in children.values().enumerate() {
        let (branch, continuation) = if i == last_index {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        if child.is_dir() {
            totals.dirs += 1;
            out.push_str(&format!("{}{}{}\n", BLUE, child.name, RESET));
            walk(
                child,
                &format!("{}{}", prefix, continuation),
                depth - 1,
                out,
                totals,
            );
        } else {
            totals.files += 1;
            out.push_str(&child.name);
            if let Some(target) = child.target() {
                out.push_str(&format!(" -> {}", target));
            }
            out.push('\n');
        }
    }
}

#[async_trait]
impl CommandHandler for Tree {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let depth = numeric_flag_value(cmd, 'L').unwrap_or(DEFAULT_DEPTH);
        let target = cmd
            .args
            .iter()
            .find(|a| !a.chars().all(|c| c.is_ascii_digit()))
            .map(|a| ctx.expand_path(a))
            .unwrap_or_else(|| ".".to_string());

        let Some(node) = ctx.fs.resolve(&target, &ctx.cwd) else {
            return Ok(CmdOutput::err(
                format!("tree: {}: No such file or directory\n", target),
                1,
            ));
        };
        if !node.is_dir() {
            return Ok(CmdOutput::ok(format!(
                "{}\n\n0 directories, 1 file\n",
                target
            )));
        }

        let mut out = format!("{}{}{}\n", BLUE, target, RESET);
        let mut totals = Totals { dirs: 0, files: 0 };
        walk(node, "", depth, &mut out, &mut totals);
        out.push_str(&format!(
            "\n{} directories, {} files\n",
            totals.dirs, totals.files
        ));
        Ok(CmdOutput::ok(out))
    }
}
