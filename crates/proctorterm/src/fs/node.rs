//! Virtual filesystem node tree.
//!
//! The tree has a single root named `/`. Directory children are kept in a
//! `BTreeMap` so listings come out lexicographically sorted without an extra
//! sort at read time; insertion order is never observable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Default display permissions per node kind.
pub const FILE_PERMS: &str = "-rw-r--r--";
pub const DIR_PERMS: &str = "drwxr-xr-x";
pub const SYMLINK_PERMS: &str = "lrwxrwxrwx";
pub const EXEC_PERMS: &str = "-rwxr-xr-x";

/// What a node is: file, directory, or symlink.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    File { content: String },
    Directory { children: BTreeMap<String, FsNode> },
    Symlink { target: String },
}

/// A node in the virtual filesystem tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FsNode {
    /// Name, unique among siblings. The root is named `/`.
    pub name: String,
    pub kind: NodeKind,
    /// Display-only permission string, e.g. `drwxr-xr-x`.
    pub permissions: String,
    pub modified: DateTime<Utc>,
}

impl FsNode {
    /// Create a regular file node.
    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File {
                content: content.into(),
            },
            permissions: FILE_PERMS.to_string(),
            modified: Utc::now(),
        }
    }

    /// Create an empty directory node.
    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory {
                children: BTreeMap::new(),
            },
            permissions: DIR_PERMS.to_string(),
            modified: Utc::now(),
        }
    }

    /// Create a symlink node pointing at `target` (resolved relative to the
    /// symlink's containing directory).
    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Symlink {
                target: target.into(),
            },
            permissions: SYMLINK_PERMS.to_string(),
            modified: Utc::now(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, NodeKind::Symlink { .. })
    }

    /// File content, if this is a file.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content } => Some(content),
            _ => None,
        }
    }

    /// Symlink target, if this is a symlink.
    pub fn target(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Symlink { target } => Some(target),
            _ => None,
        }
    }

    /// Children map, if this is a directory.
    pub fn children(&self) -> Option<&BTreeMap<String, FsNode>> {
        match &self.kind {
            NodeKind::Directory { children } => Some(children),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut BTreeMap<String, FsNode>> {
        match &mut self.kind {
            NodeKind::Directory { children } => Some(children),
            _ => None,
        }
    }

    /// Size in bytes for `ls -l` and `wc`-style displays. Directories report
    /// a conventional 4096.
    pub fn size(&self) -> usize {
        match &self.kind {
            NodeKind::File { content } => content.len(),
            NodeKind::Directory { .. } => 4096,
            NodeKind::Symlink { target } => target.len(),
        }
    }

    /// Whether the owner execute bit is set in the display permissions.
    pub fn is_executable(&self) -> bool {
        self.is_file() && self.permissions.as_bytes().get(3) == Some(&b'x')
    }
}
