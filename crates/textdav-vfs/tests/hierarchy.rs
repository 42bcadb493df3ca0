//! Integration tests for the hierarchy as seen through [`DavFs`].
//!
//! Every test builds a filesystem from manifest text, mutates it through the
//! public surface, and checks the structural guarantees hold afterwards:
//! parents exist, listings are complete, subtrees move and vanish as a unit.

use std::sync::atomic::{AtomicBool, Ordering};

use textdav_vfs::{
    DavFs, FileAttr, FileType, OpenFlags, PropName, PropPatch, PropStatus, Property, VfsConfig,
    VfsError, VirtualFs, path, synthetic_content,
};

const MANIFEST: &str = "\
# sample library
/docs/readme.txt#128#Notes
/docs/guide/intro.md#64
/docs/guide/setup.md#32#Setup Guide
/media/movies/1.mkv#4096#Feature #1
/top.txt#5
";

fn library() -> VirtualFs {
    VirtualFs::from_manifest_str(MANIFEST, VfsConfig::default()).unwrap()
}

/// Every stored path other than the root has a stored directory parent.
fn assert_closed(fs: &VirtualFs) {
    let table = fs.store().read();
    for p in table.paths() {
        if let Some(parent) = path::parent(&p) {
            let node = table
                .get(parent)
                .unwrap_or_else(|| panic!("{} has no parent entry", p));
            assert!(node.read().is_dir(), "parent of {} is a file", p);
        }
    }
}

#[test]
fn manifest_scenario() {
    let fs = library();

    let attr = fs.stat("/docs/readme.txt").unwrap();
    assert_eq!(attr.name, "Notes");
    assert_eq!(attr.size, 128);
    assert_eq!(attr.kind, FileType::File);
    assert_eq!(attr.perm, 0o644);

    let root = fs.list_children("/").unwrap();
    let docs = root.iter().find(|e| e.path == "/docs").unwrap();
    assert!(docs.is_dir());
    assert_eq!(docs.size, 0);

    let content = fs.read_all("/docs/readme.txt").unwrap();
    assert_eq!(content, synthetic_content("/docs/readme.txt", 128).unwrap());

    let props = fs.read_properties("/docs/readme.txt").unwrap();
    assert!(props[0].name.is_display_name());
    assert_eq!(props[0].value.as_text(), Some("Notes"));
}

#[test]
fn display_names_keep_hashes() {
    let fs = library();
    assert_eq!(fs.stat("/media/movies/1.mkv").unwrap().name, "Feature #1");
    assert_eq!(fs.stat("/docs/guide/setup.md").unwrap().name, "Setup Guide");
}

#[test]
fn hierarchy_is_closed_after_load_and_mutations() {
    let fs = library();
    assert_closed(&fs);

    fs.mkdir("/a/b/c").unwrap();
    fs.open("/x/y/z.txt", OpenFlags::create()).unwrap().close().unwrap();
    fs.rename("/docs/guide", "/archive/2024/guide").unwrap();
    fs.remove_subtree("/media/movies").unwrap();
    assert_closed(&fs);
}

#[test]
fn listing_is_complete_and_sorted() {
    let fs = library();
    let table_paths = fs.store().paths();

    for dir in ["/", "/docs", "/docs/guide", "/media", "/media/movies"] {
        let listed: Vec<String> = fs
            .list_children(dir)
            .unwrap()
            .into_iter()
            .map(|e| e.path)
            .collect();
        let mut expected: Vec<String> = table_paths
            .iter()
            .filter(|p| path::parent(p) == Some(dir))
            .cloned()
            .collect();
        expected.sort();
        assert_eq!(listed, expected, "listing of {}", dir);
    }
}

#[test]
fn remove_cascades_over_subtree() {
    let fs = library();
    let before = fs.store().len();

    // /docs, readme, guide, intro, setup
    let removed = fs.remove_subtree("/docs").unwrap();
    assert_eq!(removed, 5);
    assert_eq!(fs.store().len(), before - 5);

    for gone in ["/docs", "/docs/readme.txt", "/docs/guide", "/docs/guide/intro.md"] {
        assert!(matches!(fs.stat(gone), Err(VfsError::NotFound(_))), "{}", gone);
    }
    assert!(fs.exists("/top.txt"));
}

#[test]
fn rename_moves_whole_subtree() {
    let fs = library();
    let before = fs.store().len();

    fs.rename("/docs", "/library/docs").unwrap();

    assert!(!fs.exists("/docs"));
    assert!(!fs.exists("/docs/guide/intro.md"));
    assert_eq!(fs.stat("/library/docs/readme.txt").unwrap().name, "Notes");
    assert_eq!(fs.stat("/library/docs/guide/intro.md").unwrap().size, 64);
    assert_eq!(fs.stat("/library/docs").unwrap().name, "docs");
    // One synthesized parent for the destination.
    assert_eq!(fs.store().len(), before + 1);

    let moved = fs.read_all("/library/docs/guide/intro.md").unwrap();
    assert_eq!(moved, synthetic_content("/docs/guide/intro.md", 64).unwrap());
}

#[test]
fn rename_is_atomic_for_observers() {
    let fs = library();
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                let table = fs.store().read();
                let at_src = table.contains("/docs/guide/intro.md");
                let at_dst = table.contains("/moved/guide/intro.md");
                assert!(at_src ^ at_dst, "intro.md seen in {} places", at_src as u8 + at_dst as u8);
                assert_eq!(table.contains("/docs"), at_src);
            }
        });

        for _ in 0..50 {
            fs.rename("/docs", "/moved").unwrap();
            fs.rename("/moved", "/docs").unwrap();
        }
        done.store(true, Ordering::Release);
    });

    assert!(fs.exists("/docs/guide/intro.md"));
}

#[test]
fn rename_into_own_subtree_is_rejected() {
    let fs = library();
    let err = fs.rename("/docs", "/docs/guide/docs").unwrap_err();
    assert!(matches!(err, VfsError::InvalidArgument(_)));
    assert_eq!(err.status_code(), 400);
    assert!(fs.exists("/docs/guide/intro.md"));
}

#[test]
fn property_round_trip() {
    let fs = library();
    let custom = PropName::new("http://example.com/ns", "rating");

    let stats = fs
        .patch_properties(
            "/top.txt",
            &[
                PropPatch::set(PropName::display_name(), "Top"),
                PropPatch::set(custom.clone(), "five"),
                PropPatch::remove(PropName::dav("resourcetype")),
            ],
        )
        .unwrap();
    assert_eq!(stats[0].status, PropStatus::Ok);
    assert_eq!(stats[1].status, PropStatus::Ok);
    assert_eq!(stats[2].status, PropStatus::Forbidden);
    assert_eq!(stats[2].status.http_code(), 403);

    assert_eq!(fs.stat("/top.txt").unwrap().name, "Top");
    let props = fs.read_properties("/top.txt").unwrap();
    let rating = props.iter().find(|p| p.name == custom).unwrap();
    assert_eq!(rating.value.as_text(), Some("five"));
    let listed = fs.list_children("/").unwrap();
    let top = listed.iter().find(|e| e.path == "/top.txt").unwrap();
    assert_eq!(top.display_name, "Top");
    assert_eq!(top.name, "top.txt");

    fs.patch_properties("/top.txt", &[PropPatch::remove(custom.clone())])
        .unwrap();
    let props = fs.read_properties("/top.txt").unwrap();
    assert!(props.iter().all(|p| p.name != custom));
}

#[test]
fn failed_load_changes_nothing() {
    let fs = library();
    let before = fs.store().paths();

    let err = fs
        .load_str("/new/a.txt#1\n/top.txt/inside#2\n")
        .unwrap_err();
    assert!(matches!(err, VfsError::InvalidOperation(_)));
    assert_eq!(fs.store().paths(), before);

    let err = fs.load_str("/new/b.txt#1\n/new/c.txt\n").unwrap_err();
    assert!(matches!(err, VfsError::Manifest(_)));
    assert_eq!(fs.store().paths(), before);
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("files.txt");
    std::fs::write(&manifest, MANIFEST).unwrap();

    let fs = VirtualFs::default();
    let summary = fs.load_path(&manifest).unwrap();
    assert_eq!(summary.files, 5);
    // docs, docs/guide, media, media/movies (root already present)
    assert_eq!(summary.directories, 4);
    assert!(fs.stat("/media").unwrap().is_dir());

    assert!(fs.load_path(dir.path().join("missing.txt")).is_err());
}

#[test]
fn read_only_refuses_every_mutation() {
    let fs = VirtualFs::from_manifest_str(MANIFEST, VfsConfig::read_only()).unwrap();
    let before = fs.store().paths();

    let results = [
        fs.mkdir("/new").err(),
        fs.remove_subtree("/docs").err(),
        fs.rename("/docs", "/other").err(),
        fs.open("/top.txt", OpenFlags::write()).err(),
        fs.open("/fresh.txt", OpenFlags::create()).err(),
        fs.patch_properties("/top.txt", &[PropPatch::set(PropName::display_name(), "T")])
            .err(),
    ];
    for err in results {
        let err = err.expect("mutation should fail");
        assert!(matches!(err, VfsError::PermissionDenied(_)), "{}", err);
        assert_eq!(err.status_code(), 403);
    }

    assert_eq!(fs.store().paths(), before);
    assert_eq!(fs.stat("/docs").unwrap().perm, 0o555);
    assert_eq!(fs.read_all("/top.txt").unwrap().len(), 5);
}

#[test]
fn snapshots_serialize_to_json() {
    let fs = library();

    let attr = fs.stat("/docs/readme.txt").unwrap();
    let json = serde_json::to_value(&attr).unwrap();
    assert_eq!(json["name"], "Notes");
    assert_eq!(json["kind"], "File");
    assert_eq!(json["size"], 128);
    let back: FileAttr = serde_json::from_value(json).unwrap();
    assert_eq!(back, attr);

    let props = fs.read_properties("/docs").unwrap();
    let text = serde_json::to_string(&props).unwrap();
    let back: Vec<Property> = serde_json::from_str(&text).unwrap();
    assert_eq!(back, props);
}
