//! ls - directory listings.
//!
//! Usage:
//!   ls [path]
//!   ls -a          # include dotfiles plus . and ..
//!   ls -l          # long format, fixed-width columns
//!   ls -la         # both

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CmdOutput, CommandHandler};
use crate::ansi::{BLUE, CYAN, GREEN, RESET};
use crate::context::CommandContext;
use crate::error::Result;
use crate::fs::FsNode;
use crate::parser::ParsedCommand;

pub struct Ls;

fn colour_name(node: &FsNode) -> String {
    if node.is_dir() {
        format!("{}{}{}", BLUE, node.name, RESET)
    } else if node.is_symlink() {
        format!("{}{}{}", CYAN, node.name, RESET)
    } else if node.is_executable() {
        format!("{}{}{}", GREEN, node.name, RESET)
    } else {
        node.name.clone()
    }
}

fn format_mtime(ts: DateTime<Utc>) -> String {
    ts.format("%b %e %H:%M").to_string()
}

fn long_row(node: &FsNode, user: &str) -> String {
    let name = if node.is_symlink() {
        format!(
            "{} -> {}",
            colour_name(node),
            node.target().unwrap_or_default()
        )
    } else {
        colour_name(node)
    };
    format!(
        "{} {:>2} {:<9} {:<9} {:>6} {} {}",
        node.permissions,
        1,
        user,
        user,
        node.size(),
        format_mtime(node.modified),
        name,
    )
}

#[async_trait]
impl CommandHandler for Ls {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let all = cmd.flag("a");
        let long = cmd.flag("l");
        let target = cmd
            .args
            .first()
            .map(|a| ctx.expand_path(a))
            .unwrap_or_else(|| ctx.cwd.clone());

        let Some(node) = ctx.fs.resolve(&target, &ctx.cwd) else {
            return Ok(CmdOutput::err(
                format!("ls: cannot access '{}': No such file or directory\n", target),
                2,
            ));
        };

        // A file argument lists as itself.
        if !node.is_dir() {
            let line = if long {
                long_row(node, &ctx.user)
            } else {
                colour_name(node)
            };
            return Ok(CmdOutput::ok(format!("{}\n", line)));
        }

        let mut entries: Vec<&FsNode> = node
            .children()
            .map(|c| c.values().collect())
            .unwrap_or_default();
        entries.retain(|n| all || !n.name.starts_with('.'));

        if long {
            let mut out = String::new();
            if all {
                out.push_str(&format!(
                    "drwxr-xr-x  2 {:<9} {:<9} {:>6} {} {}{}{}\n",
                    ctx.user,
                    ctx.user,
                    4096,
                    format_mtime(node.modified),
                    BLUE,
                    ".",
                    RESET
                ));
                out.push_str(&format!(
                    "drwxr-xr-x  2 {:<9} {:<9} {:>6} {} {}{}{}\n",
                    ctx.user,
                    ctx.user,
                    4096,
                    format_mtime(node.modified),
                    BLUE,
                    "..",
                    RESET
                ));
            }
            for entry in &entries {
                out.push_str(&long_row(entry, &ctx.user));
                out.push('\n');
            }
            return Ok(CmdOutput::ok(out));
        }

        let mut names: Vec<String> = Vec::new();
        if all {
            names.push(format!("{}.{}", BLUE, RESET));
            names.push(format!("{}..{}", BLUE, RESET));
        }
        names.extend(entries.iter().map(|n| colour_name(n)));
        if names.is_empty() {
            return Ok(CmdOutput::ok(""));
        }
        Ok(CmdOutput::ok(format!("{}\n", names.join("  "))))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::testutil::run_with;
    use crate::fs::EXEC_PERMS;

    fn ctx_with_files() -> CommandContext {
        let mut ctx = CommandContext::new();
        ctx.fs.mkdir("/work/src", "/", true).unwrap();
        ctx.fs.write_file("/work/readme.md", "/", "docs").unwrap();
        ctx.fs.write_file("/work/.env", "/", "secret").unwrap();
        ctx.cwd = "/work".to_string();
        ctx
    }

    #[tokio::test]
    async fn plain_listing_sorted_without_dotfiles() {
        let mut ctx = ctx_with_files();
        let out = run_with(&Ls, "ls", &mut ctx, None).await;
        assert!(out.is_success());
        assert!(!out.output.contains(".env"));
        let readme_at = out.output.find("readme.md").unwrap();
        let src_at = out.output.find("src").unwrap();
        assert!(readme_at < src_at);
    }

    #[tokio::test]
    async fn dash_a_includes_hidden_and_dots() {
        let mut ctx = ctx_with_files();
        let out = run_with(&Ls, "ls -a", &mut ctx, None).await;
        assert!(out.output.contains(".env"));
        assert!(out.output.contains(&format!("{}.{}", BLUE, RESET)));
    }

    #[tokio::test]
    async fn long_format_has_permissions_and_sizes() {
        let mut ctx = ctx_with_files();
        let out = run_with(&Ls, "ls -l", &mut ctx, None).await;
        assert!(out.output.contains("drwxr-xr-x"));
        assert!(out.output.contains("-rw-r--r--"));
        assert!(out.output.contains("candidate"));
        // One row per visible entry.
        assert_eq!(out.output.lines().count(), 2);
    }

    #[tokio::test]
    async fn directories_are_coloured() {
        let mut ctx = ctx_with_files();
        let out = run_with(&Ls, "ls", &mut ctx, None).await;
        assert!(out.output.contains(&format!("{}src{}", BLUE, RESET)));
    }

    #[tokio::test]
    async fn executables_are_coloured() {
        let mut ctx = ctx_with_files();
        ctx.fs.write_file("/work/run.sh", "/", "#!/bin/sh").unwrap();
        ctx.fs
            .set_permissions("/work/run.sh", "/", EXEC_PERMS)
            .unwrap();
        let out = run_with(&Ls, "ls", &mut ctx, None).await;
        assert!(out.output.contains(&format!("{}run.sh{}", GREEN, RESET)));
    }

    #[tokio::test]
    async fn ls_on_file_prints_the_file() {
        let mut ctx = ctx_with_files();
        let out = run_with(&Ls, "ls readme.md", &mut ctx, None).await;
        assert_eq!(out.output, "readme.md\n");

        let long = run_with(&Ls, "ls -l readme.md", &mut ctx, None).await;
        assert!(long.output.contains("-rw-r--r--"));
        assert!(long.output.contains("readme.md"));
    }

    #[tokio::test]
    async fn missing_path_is_exit_2() {
        let mut ctx = ctx_with_files();
        let out = run_with(&Ls, "ls /missing", &mut ctx, None).await;
        assert_eq!(out.exit_code, 2);
        assert!(out.output.contains("cannot access"));
    }

    #[tokio::test]
    async fn empty_directory_prints_nothing() {
        let mut ctx = ctx_with_files();
        ctx.fs.mkdir("/empty", "/", false).unwrap();
        let out = run_with(&Ls, "ls /empty", &mut ctx, None).await;
        assert_eq!(out.output, "");
    }
}
