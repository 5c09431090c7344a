//! Snapshot codec for the virtual filesystem.
//!
//! The wire shape is the host-facing contract: a recursive record of
//! `{name, type, content?, target?, permissions?, children?}` with a
//! name-keyed `children` map for directories. Because [`FsSnapshot`] derives
//! `Deserialize`, any serde front-end the host picks (JSON, YAML fixtures)
//! round-trips through [`Vfs::from_snapshot`](super::Vfs::from_snapshot).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::{FsNode, NodeKind, DIR_PERMS, FILE_PERMS, SYMLINK_PERMS};
use crate::error::{Error, Result};

/// Node kind discriminant in the snapshot format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    File,
    Directory,
    Symlink,
}

/// One node of a serialised filesystem tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SnapshotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, FsSnapshot>>,
}

pub(super) fn encode(node: &FsNode) -> FsSnapshot {
    match &node.kind {
        NodeKind::File { content } => FsSnapshot {
            name: node.name.clone(),
            kind: SnapshotKind::File,
            content: Some(content.clone()),
            target: None,
            permissions: Some(node.permissions.clone()),
            children: None,
        },
        NodeKind::Directory { children } => FsSnapshot {
            name: node.name.clone(),
            kind: SnapshotKind::Directory,
            content: None,
            target: None,
            permissions: Some(node.permissions.clone()),
            children: Some(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), encode(child)))
                    .collect(),
            ),
        },
        NodeKind::Symlink { target } => FsSnapshot {
            name: node.name.clone(),
            kind: SnapshotKind::Symlink,
            content: None,
            target: Some(target.clone()),
            permissions: Some(node.permissions.clone()),
            children: None,
        },
    }
}

pub(super) fn decode(snapshot: &FsSnapshot) -> Result<FsNode> {
    let mut node = match snapshot.kind {
        SnapshotKind::File => FsNode::file(
            snapshot.name.clone(),
            snapshot.content.clone().unwrap_or_default(),
        ),
        SnapshotKind::Directory => {
            let mut dir = FsNode::dir(snapshot.name.clone());
            if let Some(children) = &snapshot.children {
                let map = dir.children_mut().expect("just built a directory");
                for (name, child) in children {
                    let mut decoded = decode(child)?;
                    // The map key wins over a stale inner name.
                    decoded.name = name.clone();
                    map.insert(name.clone(), decoded);
                }
            }
            dir
        }
        SnapshotKind::Symlink => {
            let target = snapshot.target.clone().ok_or_else(|| {
                Error::Snapshot(format!("symlink '{}' has no target", snapshot.name))
            })?;
            FsNode::symlink(snapshot.name.clone(), target)
        }
    };
    if let Some(perms) = &snapshot.permissions {
        node.permissions = perms.clone();
    } else {
        node.permissions = match snapshot.kind {
            SnapshotKind::File => FILE_PERMS.to_string(),
            SnapshotKind::Directory => DIR_PERMS.to_string(),
            SnapshotKind::Symlink => SYMLINK_PERMS.to_string(),
        };
    }
    Ok(node)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fs::Vfs;

    #[test]
    fn round_trip_preserves_structure() {
        let mut vfs = Vfs::new();
        vfs.mkdir("/proj/src", "/", true).unwrap();
        vfs.write_file("/proj/src/main.rs", "/", "fn main() {}\n")
            .unwrap();
        vfs.symlink("src/main.rs", "/proj/entry", "/").unwrap();

        let snap = vfs.to_snapshot();
        let restored = Vfs::from_snapshot(&snap).unwrap();

        assert_eq!(
            restored.read_file("/proj/src/main.rs", "/").unwrap(),
            "fn main() {}\n"
        );
        assert_eq!(
            restored.read_file("/proj/entry", "/").unwrap(),
            "fn main() {}\n"
        );
        assert_eq!(restored.to_snapshot(), snap);
    }

    #[test]
    fn round_trip_through_json() {
        let mut vfs = Vfs::new();
        vfs.write_file("/tmp/a", "/", "alpha").unwrap();
        let snap = vfs.to_snapshot();

        let json = serde_json::to_string(&snap).unwrap();
        let parsed: FsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snap);

        let restored = Vfs::from_snapshot(&parsed).unwrap();
        assert_eq!(restored.read_file("/tmp/a", "/").unwrap(), "alpha");
    }

    #[test]
    fn decode_accepts_host_fixture_shape() {
        let json = r#"{
            "name": "/",
            "type": "directory",
            "children": {
                "app": {
                    "name": "app",
                    "type": "directory",
                    "children": {
                        "server.js": {
                            "name": "server.js",
                            "type": "file",
                            "content": "require('express')",
                            "permissions": "-rwxr-xr-x"
                        }
                    }
                }
            }
        }"#;
        let snap: FsSnapshot = serde_json::from_str(json).unwrap();
        let vfs = Vfs::from_snapshot(&snap).unwrap();
        assert!(vfs.is_directory("/app", "/"));
        assert_eq!(
            vfs.read_file("/app/server.js", "/").unwrap(),
            "require('express')"
        );
        assert!(vfs.resolve("/app/server.js", "/").unwrap().is_executable());
    }

    #[test]
    fn symlink_without_target_is_rejected() {
        let json = r#"{"name": "bad", "type": "symlink"}"#;
        let snap: FsSnapshot = serde_json::from_str(json).unwrap();
        assert!(Vfs::from_snapshot(&snap).is_err());
    }

    #[test]
    fn non_directory_root_is_rejected() {
        let json = r#"{"name": "/", "type": "file", "content": "x"}"#;
        let snap: FsSnapshot = serde_json::from_str(json).unwrap();
        assert!(Vfs::from_snapshot(&snap).is_err());
    }
}
