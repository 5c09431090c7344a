//! Challenge progression: levels, objectives, and the evaluation seam.
//!
//! The catalogue's semantic content — which command patterns complete which
//! objective — is data supplied by the host. The core ships the mechanism:
//! state tracking on the context, the [`ObjectiveEvaluator`] seam the engine
//! calls after every completed command, and [`RegexEvaluator`], a
//! rule-table-driven implementation hosts can feed instead of writing code.

use std::collections::HashSet;

use regex::Regex;

use crate::context::CommandContext;

/// One objective within a level.
#[derive(Debug, Clone)]
pub struct ObjectiveSpec {
    pub id: String,
    pub title: String,
    pub hint: String,
}

/// One level of the challenge.
#[derive(Debug, Clone)]
pub struct LevelSpec {
    pub level: u32,
    pub title: String,
    pub objectives: Vec<ObjectiveSpec>,
}

/// The full level/objective catalogue. An empty catalogue disables the
/// challenge commands gracefully.
#[derive(Debug, Clone, Default)]
pub struct ChallengeCatalog {
    pub levels: Vec<LevelSpec>,
}

impl ChallengeCatalog {
    pub fn level(&self, level: u32) -> Option<&LevelSpec> {
        self.levels.iter().find(|l| l.level == level)
    }

    pub fn max_level(&self) -> u32 {
        self.levels.iter().map(|l| l.level).max().unwrap_or(0)
    }
}

/// Per-session challenge progress, carried on the context.
#[derive(Debug, Clone)]
pub struct ChallengeState {
    pub level: u32,
    /// Seniority rank the assessment was calibrated for.
    pub rank: String,
    pub completed: HashSet<String>,
    pub hints_used: HashSet<String>,
    pub started_at_ms: u64,
    pub level_started_at_ms: u64,
}

impl Default for ChallengeState {
    fn default() -> Self {
        Self {
            level: 1,
            rank: "mid".to_string(),
            completed: HashSet::new(),
            hints_used: HashSet::new(),
            started_at_ms: 0,
            level_started_at_ms: 0,
        }
    }
}

impl ChallengeState {
    /// Whether every objective of `level` in `catalog` is complete.
    pub fn level_complete(&self, catalog: &ChallengeCatalog, level: u32) -> bool {
        catalog.level(level).is_some_and(|spec| {
            spec.objectives
                .iter()
                .all(|o| self.completed.contains(&o.id))
        })
    }
}

/// Host-supplied hook the engine invokes after each completed command.
/// Returns the ids of objectives newly satisfied by `(raw, exit_code)` and
/// the context's current state.
pub trait ObjectiveEvaluator: Send {
    fn evaluate(&self, ctx: &CommandContext, raw: &str, exit_code: i32) -> Vec<String>;
}

/// One rule of the data-driven evaluator. All present conditions must hold.
pub struct ObjectiveRule {
    pub id: String,
    /// Regex the raw command line must match.
    pub command_pattern: Option<Regex>,
    /// Require exit code 0.
    pub requires_success: bool,
    /// A VFS path that must exist; with `content_pattern`, its content must
    /// match too.
    pub vfs_path: Option<String>,
    pub content_pattern: Option<Regex>,
}

/// Regex-table evaluator: objectives complete when their rule's command and
/// filesystem conditions are met.
#[derive(Default)]
pub struct RegexEvaluator {
    rules: Vec<ObjectiveRule>,
}

impl RegexEvaluator {
    pub fn new(rules: Vec<ObjectiveRule>) -> Self {
        Self { rules }
    }
}

impl ObjectiveEvaluator for RegexEvaluator {
    fn evaluate(&self, ctx: &CommandContext, raw: &str, exit_code: i32) -> Vec<String> {
        let mut completed = Vec::new();
        for rule in &self.rules {
            if ctx.challenge.completed.contains(&rule.id) {
                continue;
            }
            if rule.requires_success && exit_code != 0 {
                continue;
            }
            if let Some(pattern) = &rule.command_pattern {
                if !pattern.is_match(raw) {
                    continue;
                }
            }
            if let Some(path) = &rule.vfs_path {
                match ctx.fs.read_file(path, &ctx.cwd) {
                    Ok(content) => {
                        if let Some(expected) = &rule.content_pattern {
                            if !expected.is_match(&content) {
                                continue;
                            }
                        }
                    }
                    Err(_) => continue,
                }
            }
            completed.push(rule.id.clone());
        }
        completed
    }
}
