//! A config file drives both the core policy and the credential gate.

use textdav_cli::{AuthOutcome, ServerConfig};
use textdav_vfs::{DavFs, VfsError, VirtualFs};

#[test]
fn config_file_drives_filesystem_and_gate() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("files.txt");
    std::fs::write(&manifest, "/docs/readme.txt#128#Notes\n/music/a.flac#2048\n").unwrap();

    let config_path = dir.path().join("textdav.ron");
    std::fs::write(
        &config_path,
        format!(
            "(manifest: Some({:?}), users: {{ \"alice\": \"secret\" }})",
            manifest.display().to_string()
        ),
    )
    .unwrap();

    let config = ServerConfig::discover(Some(&config_path)).unwrap();
    let fs = VirtualFs::new(config.vfs_config());
    let summary = fs.load_path(config.manifest.as_ref().unwrap()).unwrap();
    assert_eq!(summary.files, 2);

    assert_eq!(fs.stat("/docs/readme.txt").unwrap().name, "Notes");
    // Read-only unless the config says otherwise.
    assert!(matches!(fs.mkdir("/new"), Err(VfsError::PermissionDenied(_))));

    let gate = config.gate();
    assert_eq!(gate.check(Some("alice"), Some("secret")), AuthOutcome::Granted);
    assert_eq!(gate.check(None, None), AuthOutcome::Missing);
    assert_eq!(gate.realm(), "textdav");
}

#[test]
fn writable_deployment() {
    let config = ServerConfig::from_ron_str("(read_only: false)").unwrap();
    let fs = VirtualFs::from_manifest_str("/a.txt#1", config.vfs_config()).unwrap();
    fs.mkdir("/uploads").unwrap();
    assert!(fs.stat("/uploads").unwrap().is_dir());
    assert!(config.gate().is_open());
}
