//! Identity and session utilities: whoami, hostname, date, uname, which,
//! man, help, clear, history.

use async_trait::async_trait;
use chrono::Utc;

use super::{CmdOutput, CommandHandler};
use crate::ansi;
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

pub struct Whoami;

#[async_trait]
impl CommandHandler for Whoami {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        Ok(CmdOutput::ok(format!("{}\n", ctx.user)))
    }
}

pub struct Hostname;

#[async_trait]
impl CommandHandler for Hostname {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        Ok(CmdOutput::ok(format!("{}\n", ctx.hostname)))
    }
}

pub struct Date;

#[async_trait]
impl CommandHandler for Date {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let now = Utc::now().format("%a %b %e %H:%M:%S UTC %Y");
        Ok(CmdOutput::ok(format!("{}\n", now)))
    }
}

pub struct Uname;

#[async_trait]
impl CommandHandler for Uname {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.flag("a") {
            Ok(CmdOutput::ok(format!(
                "Linux {} 5.15.0-91-generic #101-Ubuntu SMP x86_64 GNU/Linux\n",
                ctx.hostname
            )))
        } else {
            Ok(CmdOutput::ok("Linux\n"))
        }
    }
}

pub struct Which;

/// Fixed name → path table; the sandbox has no real PATH search.
const WHICH_TABLE: &[(&str, &str)] = &[
    ("bash", "/bin/bash"),
    ("cat", "/bin/cat"),
    ("curl", "/usr/bin/curl"),
    ("docker", "/usr/bin/docker"),
    ("docker-compose", "/usr/local/bin/docker-compose"),
    ("git", "/usr/bin/git"),
    ("grep", "/bin/grep"),
    ("ls", "/bin/ls"),
    ("node", "/usr/local/bin/node"),
    ("npm", "/usr/local/bin/npm"),
    ("npx", "/usr/local/bin/npx"),
    ("pip", "/usr/bin/pip"),
    ("pip3", "/usr/bin/pip3"),
    ("python", "/usr/bin/python"),
    ("python3", "/usr/bin/python3"),
    ("wget", "/usr/bin/wget"),
];

#[async_trait]
impl CommandHandler for Which {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let Some(name) = cmd.args.first() else {
            return Ok(CmdOutput::err("usage: which command\n", 2));
        };
        match WHICH_TABLE.iter().find(|(n, _)| n == name) {
            Some((_, path)) => Ok(CmdOutput::ok(format!("{}\n", path))),
            None => Ok(CmdOutput::err(String::new(), 1)),
        }
    }
}

pub struct Man;

const MAN_PAGES: &[(&str, &str)] = &[
    (
        "ls",
        "LS(1)\n\nNAME\n    ls - list directory contents\n\nSYNOPSIS\n    ls [-a] [-l] [path]\n",
    ),
    (
        "cd",
        "CD(1)\n\nNAME\n    cd - change the working directory\n\nSYNOPSIS\n    cd [dir | -]\n",
    ),
    (
        "grep",
        "GREP(1)\n\nNAME\n    grep - print lines matching a pattern\n\nSYNOPSIS\n    grep [-r] [-i] PATTERN [FILE...]\n",
    ),
    (
        "git",
        "GIT(1)\n\nNAME\n    git - the stupid content tracker\n\nSYNOPSIS\n    git <command> [<args>]\n",
    ),
    (
        "docker",
        "DOCKER(1)\n\nNAME\n    docker - a self-sufficient runtime for containers\n\nSYNOPSIS\n    docker [OPTIONS] COMMAND\n",
    ),
    (
        "curl",
        "CURL(1)\n\nNAME\n    curl - transfer a URL\n\nSYNOPSIS\n    curl [options...] <url>\n",
    ),
];

#[async_trait]
impl CommandHandler for Man {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let Some(topic) = cmd.args.first() else {
            return Ok(CmdOutput::err("What manual page do you want?\n", 1));
        };
        match MAN_PAGES.iter().find(|(name, _)| name == topic) {
            Some((_, page)) => Ok(CmdOutput::ok(*page)),
            None => Ok(CmdOutput::err(
                format!("No manual entry for {}\n", topic),
                1,
            )),
        }
    }
}

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        Ok(CmdOutput::ok(
            "Available commands:\n\
             \n\
             Files        ls cat head tail wc grep find tree\n\
             Navigation   pwd cd mkdir touch rm cp mv\n\
             Text         echo sort uniq xargs\n\
             Session      env export history clear whoami hostname date uname which man\n\
             Tools        git docker docker-compose node npm npx python pip curl wget ping netstat\n\
             Challenge    status hint submit next-level\n\
             \n\
             Use 'man <command>' for details on a command.\n",
        ))
    }
}

pub struct Clear;

#[async_trait]
impl CommandHandler for Clear {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        Ok(CmdOutput::ok(ansi::CLEAR_SCREEN))
    }
}

pub struct History;

#[async_trait]
impl CommandHandler for History {
    async fn execute(
        &self,
        _cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        let mut out = String::new();
        for (i, entry) in ctx.history.iter().enumerate() {
            out.push_str(&format!("{:>5}  {}\n", i + 1, entry));
        }
        Ok(CmdOutput::ok(out))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::testutil::run_with;

    #[tokio::test]
    async fn identity_commands() {
        let mut ctx = CommandContext::new();
        assert_eq!(
            run_with(&Whoami, "whoami", &mut ctx, None).await.output,
            "candidate\n"
        );
        assert_eq!(
            run_with(&Hostname, "hostname", &mut ctx, None).await.output,
            "fleetbox\n"
        );
    }

    #[tokio::test]
    async fn uname_forms() {
        let mut ctx = CommandContext::new();
        assert_eq!(
            run_with(&Uname, "uname", &mut ctx, None).await.output,
            "Linux\n"
        );
        let all = run_with(&Uname, "uname -a", &mut ctx, None).await;
        assert!(all.output.contains("fleetbox"));
        assert!(all.output.contains("x86_64"));
    }

    #[tokio::test]
    async fn which_consults_fixed_table() {
        let mut ctx = CommandContext::new();
        assert_eq!(
            run_with(&Which, "which git", &mut ctx, None).await.output,
            "/usr/bin/git\n"
        );
        assert_eq!(
            run_with(&Which, "which nope", &mut ctx, None)
                .await
                .exit_code,
            1
        );
    }

    #[tokio::test]
    async fn man_known_and_unknown() {
        let mut ctx = CommandContext::new();
        let page = run_with(&Man, "man grep", &mut ctx, None).await;
        assert!(page.output.contains("GREP(1)"));

        let missing = run_with(&Man, "man frobnicate", &mut ctx, None).await;
        assert_eq!(missing.exit_code, 1);
        assert!(missing.output.contains("No manual entry"));
    }

    #[tokio::test]
    async fn clear_emits_clear_sequence() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Clear, "clear", &mut ctx, None).await;
        assert_eq!(out.output, "\x1b[2J\x1b[H");
    }

    #[tokio::test]
    async fn history_numbers_entries() {
        let mut ctx = CommandContext::new();
        ctx.history = vec!["ls".to_string(), "pwd".to_string()];
        let out = run_with(&History, "history", &mut ctx, None).await;
        assert_eq!(out.output, "    1  ls\n    2  pwd\n");
    }

    #[tokio::test]
    async fn date_has_utc_year() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Date, "date", &mut ctx, None).await;
        assert!(out.output.contains("UTC"));
        assert!(out.output.trim_end().len() > 20);
    }
}
