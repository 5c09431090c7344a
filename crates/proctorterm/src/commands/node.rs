//! node / npm / npx - scripted Node.js toolchain.
//!
//! Nothing executes for real. `node file.js` pattern-matches the file's
//! source to choose a plausible canned transcript; `node -e` supports
//! string-literal `console.log` and pure arithmetic, evaluated by a small
//! recursive-descent parser over `+ - * / ( ) .` and numeric literals.

use async_trait::async_trait;

use super::{CmdOutput, CommandHandler};
use crate::context::CommandContext;
use crate::error::Result;
use crate::parser::ParsedCommand;

const NODE_VERSION: &str = "v18.19.0";
const NPM_VERSION: &str = "10.2.3";

/// Evaluate a pure arithmetic expression (numeric literals, `+ - * / ( )`).
/// Returns `None` when the input contains anything else — callers fall back
/// to their "not supported" path rather than attempting real evaluation.
pub(crate) fn eval_arithmetic(expr: &str) -> Option<f64> {
    if !expr
        .chars()
        .all(|c| c.is_ascii_digit() || " +-*/().".contains(c))
    {
        return None;
    }
    let tokens: Vec<char> = expr.chars().filter(|c| !c.is_whitespace()).collect();
    if tokens.is_empty() {
        return None;
    }
    let mut pos = 0;
    let value = parse_sum(&tokens, &mut pos)?;
    if pos == tokens.len() {
        Some(value)
    } else {
        None
    }
}

fn parse_sum(tokens: &[char], pos: &mut usize) -> Option<f64> {
    let mut value = parse_product(tokens, pos)?;
    while let Some(&op) = tokens.get(*pos) {
        match op {
            '+' => {
                *pos += 1;
                value += parse_product(tokens, pos)?;
            }
            '-' => {
                *pos += 1;
                value -= parse_product(tokens, pos)?;
            }
            _ => break,
        }
    }
    Some(value)
}

fn parse_product(tokens: &[char], pos: &mut usize) -> Option<f64> {
    let mut value = parse_atom(tokens, pos)?;
    while let Some(&op) = tokens.get(*pos) {
        match op {
            '*' => {
                *pos += 1;
                value *= parse_atom(tokens, pos)?;
            }
            '/' => {
                *pos += 1;
                value /= parse_atom(tokens, pos)?;
            }
            _ => break,
        }
    }
    Some(value)
}

fn parse_atom(tokens: &[char], pos: &mut usize) -> Option<f64> {
    match tokens.get(*pos) {
        Some('(') => {
            *pos += 1;
            let value = parse_sum(tokens, pos)?;
            if tokens.get(*pos) != Some(&')') {
                return None;
            }
            *pos += 1;
            Some(value)
        }
        Some('-') => {
            *pos += 1;
            Some(-parse_atom(tokens, pos)?)
        }
        Some(c) if c.is_ascii_digit() => {
            let start = *pos;
            while tokens
                .get(*pos)
                .is_some_and(|c| c.is_ascii_digit() || *c == '.')
            {
                *pos += 1;
            }
            let literal: String = tokens[start..*pos].iter().collect();
            literal.parse().ok()
        }
        _ => None,
    }
}

/// Render an f64 the way Node's REPL would: integers without a decimal part.
pub(crate) fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Unescape the `\n`/`\t` sequences a string literal would carry.
pub(crate) fn unescape_literal(s: &str) -> String {
    s.replace("\\n", "\n").replace("\\t", "\t")
}

/// Extract the literal from `console.log("…")` / `console.log('…')`, or an
/// arithmetic `console.log(expr)`.
fn console_log_output(code: &str) -> Option<String> {
    let start = code.find("console.log(")? + "console.log(".len();
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

const JEST_TRANSCRIPT: &str = "\
> fleetcore-api@2.4.1 test\n\
> jest\n\
\n\
 PASS  tests/routes/vehicles.test.js\n\
 PASS  tests/routes/trips.test.js\n\
 PASS  tests/services/telemetry.test.js\n\
\n\
Test Suites: 3 passed, 3 total\n\
Tests:       27 passed, 27 total\n\
Snapshots:   0 total\n\
Time:        3.482 s\n\
Ran all test suites.\n";

pub struct Node;

#[async_trait]
impl CommandHandler for Node {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if (cmd.flag("version") || cmd.flag("v")) && cmd.args.is_empty() {
            return Ok(CmdOutput::ok(format!("{}\n", NODE_VERSION)));
        }

        // node -e 'code'
        if cmd.flag("e") {
            let Some(code) = cmd.args.first() else {
                return Ok(CmdOutput::err("node: -e requires an argument\n", 9));
            };
            if let Some(output) = console_log_output(code) {
                return Ok(CmdOutput::ok(format!("{}\n", output)));
            }
            if let Some(value) = eval_arithmetic(code) {
                return Ok(CmdOutput::ok(format!("{}\n", render_number(value))));
            }
            return Ok(CmdOutput::ok("undefined\n"));
        }

        let Some(file) = cmd.args.first() else {
            return Ok(CmdOutput::ok(format!(
                "Welcome to Node.js {}.\nType \".help\" for more information.\n",
                NODE_VERSION
            )));
        };
        let path = ctx.expand_path(file);
        let Ok(source) = ctx.fs.read_file(&path, &ctx.cwd) else {
            return Ok(CmdOutput::err(
                format!(
                    "node: internal/modules/cjs/loader: cannot find module '{}'\n",
                    path
                ),
                1,
            ));
        };

        if source.contains("express") || source.contains(".listen(") {
            return Ok(CmdOutput::ok(
                "[db] pool established (max=10)\n\
                 [telemetry] consumer connected\n\
                 FleetCore API listening on port 3000\n",
            ));
        }
        if source.contains("describe(") || source.contains("test(") || source.contains("it(") {
            return Ok(CmdOutput::ok(JEST_TRANSCRIPT));
        }
        Ok(CmdOutput::ok(format!("[executed {}]\n", file)))
    }
}

pub struct Npm;

fn npm_script_output(script: &str) -> Option<&'static str> {
    match script {
        "dev" | "start" => Some(
            "> fleetcore-api@2.4.1 dev\n\
             > nodemon src/server.js\n\
             \n\
             [nodemon] 3.0.2\n\
             [nodemon] watching path(s): src/**/*\n\
             [nodemon] starting `node src/server.js`\n\
             FleetCore API listening on port 3000\n",
        ),
        "build" => Some(
            "> fleetcore-api@2.4.1 build\n\
             > babel src -d dist\n\
             \n\
             Successfully compiled 38 files with Babel (1243ms).\n",
        ),
        "test" => Some(JEST_TRANSCRIPT),
        "lint" => Some(
            "> fleetcore-api@2.4.1 lint\n\
             > eslint src tests\n\
             \n\
             ✖ 0 problems (0 errors, 0 warnings)\n",
        ),
        "migrate" => Some(
            "> fleetcore-api@2.4.1 migrate\n\
             > knex migrate:latest\n\
             \n\
             Batch 7 run: 2 migrations\n\
             20250702_add_trip_geofence.js\n\
             20250709_driver_shift_index.js\n",
        ),
        "seed" => Some(
            "> fleetcore-api@2.4.1 seed\n\
             > knex seed:run\n\
             \n\
             Ran 4 seed files\n",
        ),
        _ => None,
    }
}

#[async_trait]
impl CommandHandler for Npm {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        if cmd.flag("version") && cmd.args.is_empty() {
            return Ok(CmdOutput::ok(format!("{}\n", NPM_VERSION)));
        }
        match cmd.args.first().map(String::as_str) {
            Some("install") | Some("i") | Some("ci") => Ok(CmdOutput::ok(
                "\nadded 212 packages, and audited 213 packages in 4s\n\
                 \n\
                 31 packages are looking for funding\n\
                 found 0 vulnerabilities\n",
            )),
            Some("run") => {
                let Some(script) = cmd.args.get(1) else {
                    return Ok(CmdOutput::err(
                        "npm error Missing script name\n",
                        1,
                    ));
                };
                match npm_script_output(script) {
                    Some(output) => Ok(CmdOutput::ok(output)),
                    None => Ok(CmdOutput::err(
                        format!(
                            "npm error Missing script: \"{}\"\n\
                             npm error To see a list of scripts, run:\n\
                             npm error   npm run\n",
                            script
                        ),
                        1,
                    )),
                }
            }
            Some("start") => Ok(CmdOutput::ok(npm_script_output("start").unwrap_or(""))),
            Some("test") | Some("t") => Ok(CmdOutput::ok(JEST_TRANSCRIPT)),
            Some(other) => Ok(CmdOutput::err(
                format!("npm error Unknown command: \"{}\"\n", other),
                1,
            )),
            None => Ok(CmdOutput::ok(
                "npm <command>\n\nUsage:\n\nnpm install\nnpm run <script>\nnpm test\n",
            )),
        }
    }
}

pub struct Npx;

#[async_trait]
impl CommandHandler for Npx {
    async fn execute(
        &self,
        cmd: &ParsedCommand,
        _ctx: &mut CommandContext,
        _stdin: Option<&str>,
    ) -> Result<CmdOutput> {
        match cmd.args.first().map(String::as_str) {
            Some("jest") => Ok(CmdOutput::ok(JEST_TRANSCRIPT)),
            Some("eslint") => Ok(CmdOutput::ok("✖ 0 problems (0 errors, 0 warnings)\n")),
            Some(tool) => Ok(CmdOutput::ok(format!("[npx executed {}]\n", tool))),
            None => Ok(CmdOutput::err("npx: missing command\n", 1)),
        }
    }
}
