//! git - simulated porcelain over per-session repository state.
//!
//! Operates on [`GitSimState`](crate::sim::GitSimState) carried by the
//! context, never on a real repository. Output tracks the real client as
//! closely as the state permits.
//!
//! # Supported subcommands
//!
//! - `git status`
//! - `git log [--oneline] [-n N]`
//! - `git branch [-a]`
//! - `git checkout [-b] <branch>`
//! - `git add <pathspec>... | . | -A`
//! - `git commit -m <message>`
//! - `git diff`
//! - `git remote -v`
//! - `git init`
//! - `git stash`
//! - `git pull` / `git push`
//! - `git --version`

use async_trait::async_trait;
use chrono::Utc;

use super::{numeric_flag_value, CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;
use crate::sim::CommitEntry;

const REMOTE_URL: &str = "git@github.com:fleetcore/fleetcore-api.git";

pub struct Git;

#[async_trait]
impl CommandHandler for Git {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.flag("version") && cmd.args.is_empty() {
            return Ok(CmdOutput::ok("git version 2.43.0\n"));
        }
        let Some(subcommand) = cmd.args.first().map(String::clone) else {
            return Ok(CmdOutput::err(
                "usage: git <command> [<args>]\n\n\
                 Available commands:\n\
                 \tstatus    Show the working tree status\n\
                 \tlog       Show commit logs\n\
                 \tbranch    List or create branches\n\
                 \tcheckout  Switch branches\n\
                 \tadd       Add file contents to the index\n\
                 \tcommit    Record changes to the repository\n\
                 \tdiff      Show changes\n\
                 \tremote    Manage remotes\n\
                 \tinit      Create an empty Git repository\n\
                 \tstash     Stash local changes\n\
                 \tpull      Fetch and integrate\n\
                 \tpush      Update remote refs\n",
                1,
            ));
        };

        match subcommand.as_str() {
            "status" => git_status(ctx),
            "log" => git_log(cmd, ctx),
            "branch" => git_branch(cmd, ctx),
            "checkout" => git_checkout(cmd, ctx),
            "add" => git_add(cmd, ctx),
            "commit" => git_commit(cmd, ctx),
            "diff" => git_diff(ctx),
            "remote" => git_remote(ctx),
            "init" => git_init(ctx),
            "stash" => git_stash(ctx),
            "pull" => Ok(CmdOutput::ok("Already up to date.\n")),
            "push" => git_push(ctx),
            other => Ok(CmdOutput::err(
                format!("git: '{}' is not a git command. See 'git --help'.\n", other),
                1,
            )),
        }
    }
}

fn git_status(ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &ctx.sim.git;
    let mut out = format!("On branch {}\n", git.branch);

    if git.staged.is_empty() && git.modified.is_empty() {
        out.push_str("nothing to commit, working tree clean\n");
        return Ok(CmdOutput::ok(out));
    }
    if !git.staged.is_empty() {
        out.push_str(
            "Changes to be committed:\n  (use \"git restore --staged <file>...\" to unstage)\n",
        );
        for file in &git.staged {
            out.push_str(&format!("\tmodified:   {}\n", file));
        }
        out.push('\n');
    }
    if !git.modified.is_empty() {
        out.push_str(
            "Changes not staged for commit:\n  (use \"git add <file>...\" to update what will be committed)\n",
        );
        for file in &git.modified {
            out.push_str(&format!("\tmodified:   {}\n", file));
        }
        out.push('\n');
    }
    Ok(CmdOutput::ok(out))
}

fn author_email(author: &str) -> String {
    let first = author
        .split_whitespace()
        .next()
        .unwrap_or("dev")
        .to_lowercase();
    format!("{}@fleetcore.io", first)
}

fn git_log(cmd: &ParsedCommand, ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &ctx.sim.git;
    let limit = numeric_flag_value(cmd, 'n').unwrap_or(git.commits.len());
    let mut out = String::new();
    for (i, commit) in git.commits.iter().take(limit).enumerate() {
        if cmd.flag("oneline") {
            out.push_str(&format!("{} {}\n", commit.hash, commit.message));
        } else {
            if i == 0 {
                out.push_str(&format!(
                    "commit {} (HEAD -> {})\n",
                    commit.hash, git.branch
                ));
            } else {
                out.push_str(&format!("commit {}\n", commit.hash));
            }
            out.push_str(&format!(
                "Author: {} <{}>\n",
                commit.author,
                author_email(&commit.author)
            ));
            out.push_str(&format!("Date:   {}\n\n", commit.date));
            out.push_str(&format!("    {}\n\n", commit.message));
        }
    }
    Ok(CmdOutput::ok(out))
}

fn git_branch(cmd: &ParsedCommand, ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &ctx.sim.git;
    let mut out = String::new();
    for branch in &git.branches {
        if branch == &git.branch {
            out.push_str(&format!("* {}\n", branch));
        } else {
            out.push_str(&format!("  {}\n", branch));
        }
    }
    if cmd.flag("a") {
        out.push_str("  remotes/origin/HEAD -> origin/main\n");
        out.push_str("  remotes/origin/main\n");
        out.push_str("  remotes/origin/develop\n");
    }
    Ok(CmdOutput::ok(out))
}

fn git_checkout(cmd: &ParsedCommand, ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &mut ctx.sim.git;
    let Some(target) = cmd.args.get(1).cloned() else {
        return Ok(CmdOutput::err("git checkout: missing branch name\n", 1));
    };
    if cmd.flag("b") {
        if git.branches.contains(&target) {
            return Ok(CmdOutput::err(
                format!("fatal: a branch named '{}' already exists\n", target),
                128,
            ));
        }
        git.branches.push(target.clone());
        git.branches.sort();
        git.branch = target.clone();
        return Ok(CmdOutput::ok(format!(
            "Switched to a new branch '{}'\n",
            target
        )));
    }
    if git.branches.contains(&target) {
        git.branch = target.clone();
        return Ok(CmdOutput::ok(format!("Switched to branch '{}'\n", target)));
    }
    Ok(CmdOutput::err(
        format!(
            "error: pathspec '{}' did not match any file(s) known to git\n",
            target
        ),
        1,
    ))
}

fn git_add(cmd: &ParsedCommand, ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &mut ctx.sim.git;
    let paths = &cmd.args[1..];
    let stage_all = cmd.flag("A") || paths.iter().any(|p| p == ".");

    if stage_all {
        let mut moved: Vec<String> = git.modified.drain(..).collect();
        git.staged.append(&mut moved);
        return Ok(CmdOutput::ok(""));
    }
    if paths.is_empty() {
        return Ok(CmdOutput::err(
            "Nothing specified, nothing added.\nhint: Maybe you wanted to say 'git add .'?\n",
            1,
        ));
    }
    for path in paths {
        if let Some(pos) = git.modified.iter().position(|m| m == path) {
            let file = git.modified.remove(pos);
            git.staged.push(file);
        } else if !git.staged.iter().any(|s| s == path) {
            git.staged.push(path.clone());
        }
    }
    Ok(CmdOutput::ok(""))
}

fn git_commit(cmd: &ParsedCommand, ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &mut ctx.sim.git;
    if !cmd.flag("m") {
        return Ok(CmdOutput::err(
            "error: option -m requires a message\n",
            1,
        ));
    }
    let Some(message) = cmd.args.get(1).cloned() else {
        return Ok(CmdOutput::err(
            "error: option -m requires a message\n",
            1,
        ));
    };
    if git.staged.is_empty() {
        return Ok(CmdOutput::err(
            format!(
                "On branch {}\nnothing to commit, working tree clean\n",
                git.branch
            ),
            1,
        ));
    }

    let files = git.staged.len();
    let hash = git.next_hash();
    git.commits.insert(
        0,
        CommitEntry {
            hash: hash.clone(),
            message: message.clone(),
            author: "candidate".to_string(),
            date: Utc::now().format("%a %b %e %H:%M:%S %Y +0000").to_string(),
        },
    );
    git.staged.clear();

    Ok(CmdOutput::ok(format!(
        "[{} {}] {}\n {} file{} changed, {} insertions(+), {} deletions(-)\n",
        git.branch,
        hash,
        message,
        files,
        if files == 1 { "" } else { "s" },
        files * 5 + 2,
        files
    )))
}

fn git_diff(ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &ctx.sim.git;
    if git.modified.is_empty() {
        return Ok(CmdOutput::ok(""));
    }
    let mut out = String::new();
    for file in &git.modified {
        out.push_str(&format!(
            "diff --git a/{file} b/{file}\n\
             index 3f1a2bc..92d04e7 100644\n\
             --- a/{file}\n\
             +++ b/{file}\n\
             @@ -12,6 +12,9 @@\n \
              const router = express.Router();\n\
             +\n\
             +// refreshed while investigating the failing health check\n\
             +router.use(requestLogger);\n \
              module.exports = router;\n",
            file = file
        ));
    }
    Ok(CmdOutput::ok(out))
}

fn git_remote(_ctx: &mut CommandContext) -> Result<CmdOutput> {
    Ok(CmdOutput::ok(format!(
        "origin\t{url} (fetch)\norigin\t{url} (push)\n",
        url = REMOTE_URL
    )))
}

fn git_init(ctx: &mut CommandContext) -> Result<CmdOutput> {
    Ok(CmdOutput::ok(format!(
        "Initialized empty Git repository in {}/.git/\n",
        ctx.cwd
    )))
}

fn git_stash(ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &mut ctx.sim.git;
    if git.modified.is_empty() {
        return Ok(CmdOutput::ok("No local changes to save\n"));
    }
    let head = git.commits.first();
    let label = head
        .map(|c| format!("{} {}", c.hash, c.message))
        .unwrap_or_else(|| "0000000 (no commits)".to_string());
    let mut moved: Vec<String> = git.modified.drain(..).collect();
    git.stashed.append(&mut moved);
    Ok(CmdOutput::ok(format!(
        "Saved working directory and index state WIP on {}: {}\n",
        git.branch, label
    )))
}

fn git_push(ctx: &mut CommandContext) -> Result<CmdOutput> {
    let git = &ctx.sim.git;
    Ok(CmdOutput::ok(format!(
        "To {}\n   {}..{}  {} -> {}\n",
        REMOTE_URL,
        "9c4f1e0",
        git.commits.first().map(|c| c.hash.as_str()).unwrap_or("main"),
        git.branch,
        git.branch
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::testutil::run_with;

    #[tokio::test]
    async fn status_shows_modified_then_clean() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Git, "git status", &mut ctx, None).await;
        assert!(out.output.contains("On branch main"));
        assert!(out.output.contains("Changes not staged for commit"));
        assert!(out.output.contains("src/routes/vehicles.js"));

        ctx.sim.git.modified.clear();
        let clean = run_with(&Git, "git status", &mut ctx, None).await;
        assert!(clean.output.contains("working tree clean"));
    }

    #[tokio::test]
    async fn log_oneline_and_limit() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Git, "git log --oneline", &mut ctx, None).await;
        assert_eq!(out.output.lines().count(), 5);

        let limited = run_with(&Git, "git log --oneline -n 2", &mut ctx, None).await;
        assert_eq!(limited.output.lines().count(), 2);

        let full = run_with(&Git, "git log -n 1", &mut ctx, None).await;
        assert!(full.output.contains("commit "));
        assert!(full.output.contains("(HEAD -> main)"));
        assert!(full.output.contains("Author: "));
    }

    #[tokio::test]
    async fn add_then_commit_prepends_entry() {
        let mut ctx = CommandContext::new();
        run_with(&Git, "git add .", &mut ctx, None).await;
        assert!(ctx.sim.git.modified.is_empty());
        assert_eq!(ctx.sim.git.staged.len(), 2);

        let out = run_with(&Git, "git commit -m 'fix: telemetry nulls'", &mut ctx, None).await;
        assert!(out.is_success());
        assert!(out.output.contains("[main "));
        assert!(out.output.contains("fix: telemetry nulls"));
        assert!(out.output.contains("2 files changed"));
        assert_eq!(ctx.sim.git.commits.len(), 6);
        assert_eq!(ctx.sim.git.commits[0].message, "fix: telemetry nulls");
        assert!(ctx.sim.git.staged.is_empty());

        let hash = &ctx.sim.git.commits[0].hash;
        assert_eq!(hash.len(), 7);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn commit_with_nothing_staged_fails() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Git, "git commit -m 'nope'", &mut ctx, None).await;
        assert_eq!(out.exit_code, 1);
        assert!(out.output.contains("nothing to commit"));
    }

    #[tokio::test]
    async fn checkout_and_branch() {
        let mut ctx = CommandContext::new();
        let created = run_with(&Git, "git checkout -b feature/alerts", &mut ctx, None).await;
        assert_eq!(
            created.output,
            "Switched to a new branch 'feature/alerts'\n"
        );
        assert_eq!(ctx.sim.git.branch, "feature/alerts");

        let listed = run_with(&Git, "git branch", &mut ctx, None).await;
        assert!(listed.output.contains("* feature/alerts"));
        assert!(listed.output.contains("  main"));

        let back = run_with(&Git, "git checkout main", &mut ctx, None).await;
        assert_eq!(back.output, "Switched to branch 'main'\n");

        let missing = run_with(&Git, "git checkout ghost", &mut ctx, None).await;
        assert_eq!(missing.exit_code, 1);
        assert!(missing.output.contains("did not match"));
    }

    #[tokio::test]
    async fn branch_a_lists_remotes() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Git, "git branch -a", &mut ctx, None).await;
        assert!(out.output.contains("remotes/origin/main"));
    }

    #[tokio::test]
    async fn diff_covers_modified_files() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Git, "git diff", &mut ctx, None).await;
        assert!(out.output.contains("diff --git a/src/routes/vehicles.js"));
        assert!(out.output.contains("+++ b/src/services/telemetry.js"));
    }

    #[tokio::test]
    async fn remote_v_and_version() {
        let mut ctx = CommandContext::new();
        let remote = run_with(&Git, "git remote -v", &mut ctx, None).await;
        assert!(remote.output.contains("(fetch)"));
        assert!(remote.output.contains("(push)"));

        let version = run_with(&Git, "git --version", &mut ctx, None).await;
        assert_eq!(version.output, "git version 2.43.0\n");
    }

    #[tokio::test]
    async fn stash_moves_modified() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Git, "git stash", &mut ctx, None).await;
        assert!(out.output.contains("Saved working directory"));
        assert!(ctx.sim.git.modified.is_empty());
        assert_eq!(ctx.sim.git.stashed.len(), 2);

        let again = run_with(&Git, "git stash", &mut ctx, None).await;
        assert!(again.output.contains("No local changes to save"));
    }

    #[tokio::test]
    async fn unknown_subcommand() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Git, "git frobnicate", &mut ctx, None).await;
        assert_eq!(out.exit_code, 1);
        assert!(out.output.contains("is not a git command"));
    }

    #[tokio::test]
    async fn init_names_cwd() {
        let mut ctx = CommandContext::new();
        let out = run_with(&Git, "git init", &mut ctx, None).await;
        assert_eq!(
            out.output,
            "Initialized empty Git repository in /home/candidate/.git/\n"
        );
    }
}
