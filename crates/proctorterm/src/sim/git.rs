//! Simulated git repository state.

use chrono::Utc;

/// One entry of the simulated commit log, newest first.
#[derive(Debug, Clone)]
pub struct CommitEntry {
    /// Shortened 7-hex commit hash.
    pub hash: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

/// Repository state the `git` handler reads and mutates.
#[derive(Debug, Clone)]
pub struct GitSimState {
    pub branch: String,
    pub branches: Vec<String>,
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    /// Newest first.
    pub commits: Vec<CommitEntry>,
    pub stashed: Vec<String>,
    hash_seed: u64,
}

impl Default for GitSimState {
    fn default() -> Self {
        let commits = [
            ("feat: add trip telemetry ingestion endpoint", "Priya Nair"),
            ("fix: handle null GPS fixes in route matcher", "Marcus Webb"),
            ("chore: bump express to 4.19", "Priya Nair"),
            ("feat: driver availability dashboard queries", "Sofia Reyes"),
            ("Initial commit", "Marcus Webb"),
        ];
        let mut state = Self {
            branch: "main".to_string(),
            branches: vec!["develop".to_string(), "main".to_string()],
            staged: Vec::new(),
            modified: vec![
                "src/routes/vehicles.js".to_string(),
                "src/services/telemetry.js".to_string(),
            ],
            commits: Vec::new(),
            stashed: Vec::new(),
            hash_seed: Utc::now().timestamp_millis() as u64 ^ 0xdead_beef,
        };
        let mut day = 14;
        for (message, author) in commits {
            let hash = state.next_hash();
            state.commits.push(CommitEntry {
                hash,
                message: message.to_string(),
                author: author.to_string(),
                date: format!("Mon Jul {} 09:1{} 2025 +0000", day, day % 10),
            });
            day -= 2;
        }
        state
    }
}

impl GitSimState {
    /// Produce the next pseudo-random 7-hex short hash (xorshift over a
    /// timestamp-derived seed).
    pub fn next_hash(&mut self) -> String {
        let mut x = self.hash_seed;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.hash_seed = x;
        format!("{:07x}", x & 0x0fff_ffff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_with_five_commits() {
        let state = GitSimState::default();
        assert_eq!(state.commits.len(), 5);
        assert_eq!(state.branch, "main");
        assert_eq!(state.commits.last().unwrap().message, "Initial commit");
        for commit in &state.commits {
            assert_eq!(commit.hash.len(), 7);
            assert!(commit.hash.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn hashes_vary() {
        let mut state = GitSimState::default();
        let a = state.next_hash();
        let b = state.next_hash();
        assert_ne!(a, b);
        assert_eq!(a.len(), 7);
    }
}
