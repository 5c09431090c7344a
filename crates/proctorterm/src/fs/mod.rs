//! In-memory virtual filesystem.
//!
//! [`Vfs`] owns a tree of [`FsNode`]s rooted at `/` and provides POSIX-like
//! path resolution (`.`, `..`, leading `/`), symlink traversal with a bounded
//! hop count, CRUD, recursive `find`/`grep`, tab-completion candidates and a
//! lossless snapshot round-trip.
//!
//! # POSIX semantics contract
//!
//! 1. **No duplicate names**: files, directories and symlinks share one
//!    namespace per directory.
//! 2. **Type-safe writes**: [`Vfs::write_file`] and [`Vfs::append_file`] fail
//!    with "Is a directory" when the path is a directory.
//! 3. **Reads follow symlinks** transparently; `rm`/`rename` operate on the
//!    link node itself.
//! 4. **Bounded symlink chains**: resolution gives up after 20 hops, so a
//!    cyclic link graph degrades to "not found" instead of hanging.

mod node;
mod snapshot;

pub use node::{FsNode, NodeKind, DIR_PERMS, EXEC_PERMS, FILE_PERMS, SYMLINK_PERMS};
pub use snapshot::{FsSnapshot, SnapshotKind};

use std::io::{Error as IoError, ErrorKind};

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// Maximum symlink hops before resolution gives up.
const MAX_SYMLINK_HOPS: u32 = 20;

/// Standard filesystem errors, with POSIX reason strings handlers can embed
/// in their `cmd: path: reason` messages.
pub mod fs_errors {
    use super::*;

    #[inline]
    pub fn not_found() -> Error {
        IoError::new(ErrorKind::NotFound, "No such file or directory").into()
    }

    #[inline]
    pub fn is_a_directory() -> Error {
        IoError::other("Is a directory").into()
    }

    #[inline]
    pub fn not_a_directory() -> Error {
        IoError::other("Not a directory").into()
    }

    #[inline]
    pub fn already_exists() -> Error {
        IoError::new(ErrorKind::AlreadyExists, "File exists").into()
    }

    #[inline]
    pub fn permission_denied() -> Error {
        IoError::new(ErrorKind::PermissionDenied, "Permission denied").into()
    }

    /// The bare reason string of a filesystem error, for handler messages.
    pub fn reason(err: &Error) -> String {
        match err {
            Error::Io(io) => io.to_string(),
            other => other.to_string(),
        }
    }
}

/// A single `grep` hit.
#[derive(Debug, Clone, PartialEq)]
pub struct GrepMatch {
    /// Absolute path of the matching file.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// The matching line, without its newline.
    pub text: String,
}

/// The in-memory virtual filesystem.
#[derive(Debug, Clone)]
pub struct Vfs {
    root: FsNode,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    /// Create a filesystem with the default directory skeleton:
    /// `/tmp`, `/home/candidate`, `/etc`.
    pub fn new() -> Self {
        let mut vfs = Self::empty();
        for dir in ["/tmp", "/home", "/home/candidate", "/etc"] {
            let _ = vfs.mkdir(dir, "/", true);
        }
        vfs
    }

    /// Create a filesystem containing only the root directory.
    pub fn empty() -> Self {
        Self {
            root: FsNode::dir("/"),
        }
    }

    /// Root node accessor, used by the snapshot codec.
    pub(crate) fn root(&self) -> &FsNode {
        &self.root
    }

    pub(crate) fn set_root(&mut self, root: FsNode) {
        self.root = root;
    }

    // --- path resolution ---

    /// Pure syntactic resolution of `path` against `cwd`: handles leading
    /// `/`, `.`, `..` and duplicate separators. Does not consult the tree.
    pub fn resolve_path(path: &str, cwd: &str) -> String {
        let joined = if path.starts_with('/') {
            path.to_string()
        } else if cwd == "/" {
            format!("/{}", path)
        } else {
            format!("{}/{}", cwd, path)
        };

        let mut stack: Vec<&str> = Vec::new();
        for part in joined.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    stack.pop();
                }
                p => stack.push(p),
            }
        }
        if stack.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", stack.join("/"))
        }
    }

    /// Split an absolute path into (parent, final component).
    fn split_parent(abs: &str) -> (String, String) {
        match abs.rfind('/') {
            Some(0) => ("/".to_string(), abs[1..].to_string()),
            Some(i) => (abs[..i].to_string(), abs[i + 1..].to_string()),
            None => ("/".to_string(), abs.to_string()),
        }
    }

    /// Resolve `path` to its canonical absolute form, following symlinks in
    /// every component (including the last). `None` when any component is
    /// missing or the hop budget runs out.
    fn canonicalize(&self, path: &str, cwd: &str, hops: &mut u32) -> Option<String> {
        let abs = Self::resolve_path(path, cwd);
        let parts: Vec<&str> = abs.split('/').filter(|p| !p.is_empty()).collect();
        let mut canon = String::from("/");
        let mut node = &self.root;

        for (i, part) in parts.iter().enumerate() {
            let children = node.children()?;
            let child = children.get(*part)?;
            if let NodeKind::Symlink { target } = &child.kind {
                if *hops >= MAX_SYMLINK_HOPS {
                    return None;
                }
                *hops += 1;
                // Target is relative to the symlink's containing directory.
                let mut redirected = Self::resolve_path(target, &canon);
                for rest in &parts[i + 1..] {
                    if !redirected.ends_with('/') {
                        redirected.push('/');
                    }
                    redirected.push_str(rest);
                }
                return self.canonicalize(&redirected, "/", hops);
            }
            if canon != "/" {
                canon.push('/');
            }
            canon.push_str(part);
            node = child;
        }
        Some(canon)
    }

    /// Direct lookup of a canonical path, no symlink logic.
    fn node_at(&self, canonical: &str) -> Option<&FsNode> {
        let mut node = &self.root;
        for part in canonical.split('/').filter(|p| !p.is_empty()) {
            node = node.children()?.get(part)?;
        }
        Some(node)
    }

    fn node_at_mut(&mut self, canonical: &str) -> Option<&mut FsNode> {
        let mut node = &mut self.root;
        for part in canonical.split('/').filter(|p| !p.is_empty()) {
            node = node.children_mut()?.get_mut(part)?;
        }
        Some(node)
    }

    /// Resolve a path to its node, following symlinks (bounded at 20 hops).
    pub fn resolve(&self, path: &str, cwd: &str) -> Option<&FsNode> {
        let mut hops = 0;
        let canon = self.canonicalize(path, cwd, &mut hops)?;
        self.node_at(&canon)
    }

    /// Resolve without following a final symlink; intermediate symlinks are
    /// still traversed. Returns the canonical parent path alongside the node.
    fn resolve_no_follow(&self, path: &str, cwd: &str) -> Option<(String, &FsNode)> {
        let abs = Self::resolve_path(path, cwd);
        if abs == "/" {
            return Some(("/".to_string(), &self.root));
        }
        let (parent, name) = Self::split_parent(&abs);
        let mut hops = 0;
        let parent_canon = self.canonicalize(&parent, "/", &mut hops)?;
        let node = self.node_at(&parent_canon)?.children()?.get(&name)?;
        Some((parent_canon, node))
    }

    // --- queries ---

    pub fn exists(&self, path: &str, cwd: &str) -> bool {
        self.resolve(path, cwd).is_some()
    }

    pub fn is_file(&self, path: &str, cwd: &str) -> bool {
        self.resolve(path, cwd).is_some_and(FsNode::is_file)
    }

    pub fn is_directory(&self, path: &str, cwd: &str) -> bool {
        self.resolve(path, cwd).is_some_and(FsNode::is_dir)
    }

    /// List a directory's children, lexicographically sorted.
    pub fn list_dir(&self, path: &str, cwd: &str) -> Result<Vec<&FsNode>> {
        let node = self.resolve(path, cwd).ok_or_else(fs_errors::not_found)?;
        let children = node.children().ok_or_else(fs_errors::not_a_directory)?;
        Ok(children.values().collect())
    }

    // --- file I/O ---

    pub fn read_file(&self, path: &str, cwd: &str) -> Result<String> {
        let node = self.resolve(path, cwd).ok_or_else(fs_errors::not_found)?;
        match &node.kind {
            NodeKind::File { content } => Ok(content.clone()),
            NodeKind::Directory { .. } => Err(fs_errors::is_a_directory()),
            // Unreachable: resolve() follows symlinks.
            NodeKind::Symlink { .. } => Err(fs_errors::not_found()),
        }
    }

    /// Write (overwrite) a file. Follows symlinks to an existing target;
    /// otherwise creates the file in the canonical parent directory.
    pub fn write_file(&mut self, path: &str, cwd: &str, content: &str) -> Result<()> {
        let mut hops = 0;
        if let Some(canon) = self.canonicalize(path, cwd, &mut hops) {
            let node = self.node_at_mut(&canon).ok_or_else(fs_errors::not_found)?;
            return match &mut node.kind {
                NodeKind::File { content: existing } => {
                    *existing = content.to_string();
                    node.modified = chrono::Utc::now();
                    Ok(())
                }
                NodeKind::Directory { .. } => Err(fs_errors::is_a_directory()),
                NodeKind::Symlink { .. } => Err(fs_errors::not_found()),
            };
        }

        let abs = Self::resolve_path(path, cwd);
        let (parent, name) = Self::split_parent(&abs);
        if name.is_empty() {
            return Err(fs_errors::is_a_directory());
        }
        let mut hops = 0;
        let parent_canon = self
            .canonicalize(&parent, "/", &mut hops)
            .ok_or_else(fs_errors::not_found)?;
        let dir = self
            .node_at_mut(&parent_canon)
            .and_then(FsNode::children_mut)
            .ok_or_else(fs_errors::not_a_directory)?;
        dir.insert(name.clone(), FsNode::file(name, content));
        Ok(())
    }

    /// Append to a file, creating it if absent.
    pub fn append_file(&mut self, path: &str, cwd: &str, content: &str) -> Result<()> {
        let mut hops = 0;
        if let Some(canon) = self.canonicalize(path, cwd, &mut hops) {
            let node = self.node_at_mut(&canon).ok_or_else(fs_errors::not_found)?;
            return match &mut node.kind {
                NodeKind::File { content: existing } => {
                    existing.push_str(content);
                    node.modified = chrono::Utc::now();
                    Ok(())
                }
                NodeKind::Directory { .. } => Err(fs_errors::is_a_directory()),
                NodeKind::Symlink { .. } => Err(fs_errors::not_found()),
            };
        }
        self.write_file(path, cwd, content)
    }

    /// Bump a file's mtime, creating it empty if absent.
    pub fn touch(&mut self, path: &str, cwd: &str) -> Result<()> {
        let mut hops = 0;
        if let Some(canon) = self.canonicalize(path, cwd, &mut hops) {
            if let Some(node) = self.node_at_mut(&canon) {
                node.modified = chrono::Utc::now();
                return Ok(());
            }
        }
        self.write_file(path, cwd, "")
    }

    // --- tree mutation ---

    /// Create a directory. With `recursive`, behaves like `mkdir -p`:
    /// succeeds iff every existing prefix is a directory.
    pub fn mkdir(&mut self, path: &str, cwd: &str, recursive: bool) -> Result<()> {
        let abs = Self::resolve_path(path, cwd);
        if abs == "/" {
            return if recursive {
                Ok(())
            } else {
                Err(fs_errors::already_exists())
            };
        }

        if recursive {
            let parts: Vec<String> = abs
                .split('/')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            let mut node = &mut self.root;
            for part in parts {
                let children = node.children_mut().ok_or_else(fs_errors::not_a_directory)?;
                node = children
                    .entry(part.clone())
                    .or_insert_with(|| FsNode::dir(part));
                if !node.is_dir() {
                    return Err(fs_errors::not_a_directory());
                }
            }
            return Ok(());
        }

        let (parent, name) = Self::split_parent(&abs);
        let mut hops = 0;
        let parent_canon = self
            .canonicalize(&parent, "/", &mut hops)
            .ok_or_else(fs_errors::not_found)?;
        let dir = self
            .node_at_mut(&parent_canon)
            .and_then(FsNode::children_mut)
            .ok_or_else(fs_errors::not_a_directory)?;
        if dir.contains_key(&name) {
            return Err(fs_errors::already_exists());
        }
        dir.insert(name.clone(), FsNode::dir(name));
        Ok(())
    }

    /// Remove a file, symlink, or (with `recursive`) a directory. Refuses to
    /// remove the root. Operates on the link node itself, not its target.
    pub fn rm(&mut self, path: &str, cwd: &str, recursive: bool) -> Result<()> {
        let abs = Self::resolve_path(path, cwd);
        if abs == "/" {
            return Err(fs_errors::permission_denied());
        }
        let (parent_canon, node) = self
            .resolve_no_follow(&abs, "/")
            .ok_or_else(fs_errors::not_found)?;
        if node.is_dir() && !recursive {
            return Err(fs_errors::is_a_directory());
        }
        let name = Self::split_parent(&abs).1;
        let dir = self
            .node_at_mut(&parent_canon)
            .and_then(FsNode::children_mut)
            .ok_or_else(fs_errors::not_found)?;
        dir.remove(&name).ok_or_else(fs_errors::not_found)?;
        Ok(())
    }

    /// Copy a file or (recursively) a directory subtree.
    pub fn copy(&mut self, from: &str, to: &str, cwd: &str) -> Result<()> {
        let src = self
            .resolve(from, cwd)
            .ok_or_else(fs_errors::not_found)?
            .clone();
        self.place(src, to, cwd)
    }

    /// Move a node. The link node itself moves; targets are untouched.
    pub fn rename(&mut self, from: &str, to: &str, cwd: &str) -> Result<()> {
        let abs = Self::resolve_path(from, cwd);
        if abs == "/" {
            return Err(fs_errors::permission_denied());
        }
        let (parent_canon, _) = self
            .resolve_no_follow(&abs, "/")
            .ok_or_else(fs_errors::not_found)?;
        let name = Self::split_parent(&abs).1;
        let node = self
            .node_at_mut(&parent_canon)
            .and_then(FsNode::children_mut)
            .and_then(|c| c.remove(&name))
            .ok_or_else(fs_errors::not_found)?;
        self.place(node, to, cwd)
    }

    /// Insert `node` at `to`: into `to` when it is an existing directory
    /// (keeping the node's name), else at `to` itself (renaming the node).
    fn place(&mut self, mut node: FsNode, to: &str, cwd: &str) -> Result<()> {
        let abs = Self::resolve_path(to, cwd);
        if self.is_directory(&abs, "/") {
            let mut hops = 0;
            let canon = self
                .canonicalize(&abs, "/", &mut hops)
                .ok_or_else(fs_errors::not_found)?;
            let dir = self
                .node_at_mut(&canon)
                .and_then(FsNode::children_mut)
                .ok_or_else(fs_errors::not_a_directory)?;
            dir.insert(node.name.clone(), node);
            return Ok(());
        }
        let (parent, name) = Self::split_parent(&abs);
        let mut hops = 0;
        let parent_canon = self
            .canonicalize(&parent, "/", &mut hops)
            .ok_or_else(fs_errors::not_found)?;
        let dir = self
            .node_at_mut(&parent_canon)
            .and_then(FsNode::children_mut)
            .ok_or_else(fs_errors::not_a_directory)?;
        node.name = name.clone();
        dir.insert(name, node);
        Ok(())
    }

    /// Create a symlink node at `link` pointing to `target`.
    pub fn symlink(&mut self, target: &str, link: &str, cwd: &str) -> Result<()> {
        let abs = Self::resolve_path(link, cwd);
        let (parent, name) = Self::split_parent(&abs);
        let mut hops = 0;
        let parent_canon = self
            .canonicalize(&parent, "/", &mut hops)
            .ok_or_else(fs_errors::not_found)?;
        let dir = self
            .node_at_mut(&parent_canon)
            .and_then(FsNode::children_mut)
            .ok_or_else(fs_errors::not_a_directory)?;
        if dir.contains_key(&name) {
            return Err(fs_errors::already_exists());
        }
        dir.insert(name.clone(), FsNode::symlink(name, target));
        Ok(())
    }

    /// Replace a node's display permissions.
    pub fn set_permissions(&mut self, path: &str, cwd: &str, permissions: &str) -> Result<()> {
        let mut hops = 0;
        let canon = self
            .canonicalize(path, cwd, &mut hops)
            .ok_or_else(fs_errors::not_found)?;
        let node = self.node_at_mut(&canon).ok_or_else(fs_errors::not_found)?;
        node.permissions = permissions.to_string();
        Ok(())
    }

    // --- search ---

    /// Translate a shell glob into an anchored regex: `*` matches any run,
    /// `?` any single character, everything else is literal.
    fn glob_to_regex(glob: &str) -> Result<Regex> {
        let mut pattern = String::from("^");
        for ch in glob.chars() {
            match ch {
                '*' => pattern.push_str(".*"),
                '?' => pattern.push('.'),
                c => pattern.push_str(&regex::escape(&c.to_string())),
            }
        }
        pattern.push('$');
        Regex::new(&pattern).map_err(|e| Error::Parse(format!("bad glob: {}", e)))
    }

    /// Find every node under `base` (inclusive) whose *name* matches `glob`.
    /// Returns absolute paths; directories are included. Symlinks are
    /// matched by name but not descended.
    pub fn find(&self, base: &str, glob: &str, cwd: &str) -> Result<Vec<String>> {
        let re = Self::glob_to_regex(glob)?;
        let mut hops = 0;
        let canon = self
            .canonicalize(base, cwd, &mut hops)
            .ok_or_else(fs_errors::not_found)?;
        let node = self.node_at(&canon).ok_or_else(fs_errors::not_found)?;
        let mut hits = Vec::new();
        Self::find_walk(node, &canon, &re, &mut hits);
        Ok(hits)
    }

    fn find_walk(node: &FsNode, path: &str, re: &Regex, hits: &mut Vec<String>) {
        let display_name = if path == "/" { "/" } else { &node.name };
        if re.is_match(display_name) {
            hits.push(path.to_string());
        }
        if let Some(children) = node.children() {
            for child in children.values() {
                let child_path = if path == "/" {
                    format!("/{}", child.name)
                } else {
                    format!("{}/{}", path, child.name)
                };
                Self::find_walk(child, &child_path, re, hits);
            }
        }
    }

    /// Grep `pattern` over a file, or (with `recursive`) over every file
    /// under a directory. A directory without `recursive` yields no matches.
    pub fn grep(
        &self,
        pattern: &str,
        path: &str,
        cwd: &str,
        recursive: bool,
        ignore_case: bool,
    ) -> Result<Vec<GrepMatch>> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| Error::Parse(format!("invalid pattern: {}", e)))?;
        let mut hops = 0;
        let canon = self
            .canonicalize(path, cwd, &mut hops)
            .ok_or_else(fs_errors::not_found)?;
        let node = self.node_at(&canon).ok_or_else(fs_errors::not_found)?;

        let mut matches = Vec::new();
        match &node.kind {
            NodeKind::File { content } => {
                Self::grep_file(content, &canon, &re, &mut matches);
            }
            NodeKind::Directory { .. } if recursive => {
                Self::grep_walk(node, &canon, &re, &mut matches);
            }
            _ => {}
        }
        Ok(matches)
    }

    fn grep_file(content: &str, path: &str, re: &Regex, out: &mut Vec<GrepMatch>) {
        for (idx, line) in content.lines().enumerate() {
            if re.is_match(line) {
                out.push(GrepMatch {
                    file: path.to_string(),
                    line: idx + 1,
                    text: line.to_string(),
                });
            }
        }
    }

    fn grep_walk(node: &FsNode, path: &str, re: &Regex, out: &mut Vec<GrepMatch>) {
        if let Some(children) = node.children() {
            for child in children.values() {
                let child_path = if path == "/" {
                    format!("/{}", child.name)
                } else {
                    format!("{}/{}", path, child.name)
                };
                match &child.kind {
                    NodeKind::File { content } => {
                        Self::grep_file(content, &child_path, re, out);
                    }
                    NodeKind::Directory { .. } => {
                        Self::grep_walk(child, &child_path, re, out);
                    }
                    NodeKind::Symlink { .. } => {}
                }
            }
        }
    }

    /// Completion candidates for a partial path: the names in the resolved
    /// parent directory that start with the partial's final component, with
    /// `/` appended to directories. Sorted lexicographically.
    pub fn complete_path(&self, partial: &str, cwd: &str) -> Vec<String> {
        let (dir_part, prefix) = match partial.rfind('/') {
            Some(i) => (&partial[..=i], &partial[i + 1..]),
            None => ("", partial),
        };
        let dir_path = if dir_part.is_empty() { "." } else { dir_part };
        let Some(node) = self.resolve(dir_path, cwd) else {
            return Vec::new();
        };
        let Some(children) = node.children() else {
            return Vec::new();
        };
        children
            .values()
            .filter(|c| c.name.starts_with(prefix))
            .map(|c| {
                if c.is_dir() {
                    format!("{}/", c.name)
                } else {
                    c.name.clone()
                }
            })
            .collect()
    }

    // --- snapshot ---

    /// Serialise the whole tree to the snapshot format.
    pub fn to_snapshot(&self) -> FsSnapshot {
        snapshot::encode(&self.root)
    }

    /// Rebuild a filesystem from a snapshot.
    pub fn from_snapshot(snapshot: &FsSnapshot) -> Result<Self> {
        let root = snapshot::decode(snapshot)?;
        if !root.is_dir() {
            return Err(Error::Snapshot("root must be a directory".to_string()));
        }
        Ok(Self { root })
    }
}
