//! Filesystem snapshot round-trips and VFS invariants across the public
//! API.

use proctorterm::{FsSnapshot, Terminal, Vfs};

fn seeded_vfs() -> Vfs {
    let mut vfs = Vfs::new();
    vfs.mkdir("/srv/app/src/routes", "/", true).unwrap();
    vfs.write_file("/srv/app/package.json", "/", "{\"name\": \"fleetcore-api\"}\n")
        .unwrap();
    vfs.write_file(
        "/srv/app/src/server.js",
        "/",
        "const express = require('express');\n",
    )
    .unwrap();
    vfs.write_file("/srv/app/src/routes/v1.js", "/", "// routes\n")
        .unwrap();
    vfs.symlink("src/server.js", "/srv/app/entry", "/").unwrap();
    vfs
}

#[test]
fn snapshot_round_trip_is_structurally_equal() {
    let vfs = seeded_vfs();
    let snapshot = vfs.to_snapshot();
    let restored = Vfs::from_snapshot(&snapshot).unwrap();
    assert_eq!(restored.to_snapshot(), snapshot);
}

#[test]
fn snapshot_round_trips_through_json_text() {
    let vfs = seeded_vfs();
    let snapshot = vfs.to_snapshot();
    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let parsed: FsSnapshot = serde_json::from_str(&json).unwrap();
    let restored = Vfs::from_snapshot(&parsed).unwrap();
    assert_eq!(restored.to_snapshot(), snapshot);
}

#[test]
fn restored_tree_preserves_content_and_symlinks() {
    let vfs = seeded_vfs();
    let restored = Vfs::from_snapshot(&vfs.to_snapshot()).unwrap();
    assert_eq!(
        restored.read_file("/srv/app/entry", "/").unwrap(),
        "const express = require('express');\n"
    );
    assert!(restored.is_directory("/srv/app/src/routes", "/"));
}

#[test]
fn restored_tree_supports_find_and_grep() {
    let restored = Vfs::from_snapshot(&seeded_vfs().to_snapshot()).unwrap();
    let hits = restored.find("/srv", "*.js", "/").unwrap();
    assert_eq!(
        hits,
        vec!["/srv/app/src/routes/v1.js", "/srv/app/src/server.js"]
    );
    let matches = restored
        .grep("express", "/srv", "/", true, false)
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].file, "/srv/app/src/server.js");
    assert_eq!(matches[0].line, 1);
}

#[test]
fn write_read_invariant() {
    let mut vfs = Vfs::new();
    for (path, content) in [
        ("/tmp/a", "alpha"),
        ("/tmp/b", "with\nnewlines\n"),
        ("/tmp/c", ""),
    ] {
        vfs.write_file(path, "/", content).unwrap();
        assert_eq!(vfs.read_file(path, "/").unwrap(), content);
        assert!(vfs.exists(path, "/"));
    }
}

#[test]
fn rm_recursive_invariant() {
    let mut vfs = Vfs::new();
    vfs.mkdir("/deep/nest/ed", "/", true).unwrap();
    vfs.write_file("/deep/nest/ed/file", "/", "x").unwrap();
    vfs.rm("/deep", "/", true).unwrap();
    assert!(!vfs.exists("/deep", "/"));
    assert!(!vfs.exists("/deep/nest/ed/file", "/"));
}

#[tokio::test]
async fn engine_session_filesystem_snapshots_cleanly() {
    let mut term = Terminal::new();
    term.execute_line("mkdir -p /data/logs").await;
    term.execute_line("echo started > /data/logs/boot.log").await;

    let snapshot = term.context().fs.to_snapshot();
    let restored = Vfs::from_snapshot(&snapshot).unwrap();
    assert_eq!(
        restored.read_file("/data/logs/boot.log", "/").unwrap(),
        "started\n"
    );

    // A second terminal booted from the snapshot sees the same world.
    let mut clone = Terminal::builder().fixture(&snapshot).unwrap().build();
    let out = clone.execute_line("cat /data/logs/boot.log").await;
    assert_eq!(out.output, "started\n");
}
