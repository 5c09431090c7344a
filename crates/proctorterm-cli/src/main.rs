//! proctorterm CLI - Command line driver for the shell emulator
//!
//! Usage:
//!   proctorterm -c 'echo hello'    # Execute a command line
//!   proctorterm script.sh          # Execute a script file line by line
//!   proctorterm                    # Interactive REPL
//!   proctorterm --report           # Print the integrity report on exit

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use proctorterm::Terminal;

/// proctorterm - sandboxed assessment shell
#[derive(Parser, Debug)]
#[command(name = "proctorterm")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Execute the given command line
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file to execute line by line
    #[arg()]
    script: Option<PathBuf>,

    /// Print the session integrity report before exiting
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut term = Terminal::new();

    // Execute a single command line if provided.
    if let Some(command) = args.command {
        let result = term.execute_line(&command).await;
        print!("{}", result.output);
        finish(&mut term, args.report);
        std::process::exit(result.exit_code);
    }

    // Execute a script file if provided.
    if let Some(script_path) = args.script {
        let script = std::fs::read_to_string(&script_path)
            .with_context(|| format!("Failed to read script: {}", script_path.display()))?;
        let mut exit_code = 0;
        for line in script.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let result = term.execute_line(trimmed).await;
            print!("{}", result.output);
            exit_code = result.exit_code;
        }
        finish(&mut term, args.report);
        std::process::exit(exit_code);
    }

    // Interactive REPL over stdin lines.
    repl(&mut term).await?;
    finish(&mut term, args.report);
    Ok(())
}

async fn repl(term: &mut Terminal) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    print!("{}", strip_ansi(&term.boot()));
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim() == "exit" {
            break;
        }
        let result = term.execute_line(&line).await;
        print!("{}", strip_ansi(&result.output));
        print!("{}", strip_ansi(&term.prompt()));
        stdout.flush()?;
    }
    Ok(())
}

fn finish(term: &mut Terminal, report: bool) {
    term.stop();
    if report {
        let analysis = proctorterm::analyze(&term.events());
        eprintln!(
            "integrity score: {} ({} flags) - {}",
            analysis.score,
            analysis.flags.len(),
            analysis.summary
        );
        for flag in &analysis.flags {
            eprintln!("  [{:?}] {}: {}", flag.severity, flag.id, flag.detail);
        }
    }
}

/// The emulator emits xterm colour and cursor sequences; a pipe-friendly
/// CLI strips them.
fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for ch in chars.by_ref() {
                    if ch.is_ascii_alphabetic() || ch == '~' {
                        break;
                    }
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}
