mod common;

use assert_fs::prelude::*;
use common::{write_file, TestEnvironment};
use dotmate::{build_tree, sync_dir, visible_nodes, Error, Registry};
use filetime::FileTime;
use predicates::prelude::*;
use quickcheck_macros::quickcheck;
use serial_test::serial;

/// End-to-end tests through the public engine API

#[test]
#[serial]
fn test_add_nvim_tracks_tilde_path() {
    let env = TestEnvironment::new();
    env.create_dotfiles(
        ".config/nvim",
        &[("init.lua", "vim.g.mapleader = ' '"), ("lua/plugins.lua", "return {}")],
    );
    env.write_settings();
    let engine = env.engine();

    let report = engine.validate_and_sync("~/.config/nvim/").unwrap();
    assert_eq!(report.files_copied, 2);

    let registry = std::fs::read_to_string(engine.registry().path()).unwrap();
    assert_eq!(registry, "{\n  \"~/.config/nvim\": true\n}");

    let mirrored = std::fs::read_to_string(env.destination.join("nvim/init.lua")).unwrap();
    assert_eq!(mirrored, "vim.g.mapleader = ' '");
    assert!(env.destination.join("nvim/lua/plugins.lua").exists());
}

#[test]
#[serial]
fn test_refresh_prunes_deleted_files() {
    let env = TestEnvironment::new();
    let nvim = env.create_dotfiles(
        ".config/nvim",
        &[("init.lua", "-- init"), ("lua/plugins.lua", "return {}")],
    );
    let engine = env.engine();
    engine.validate_and_sync("~/.config/nvim").unwrap();

    std::fs::remove_file(nvim.join("init.lua")).unwrap();
    let summary = engine.refresh_all().unwrap();

    assert!(summary.all_succeeded());
    let (_, report) = summary.succeeded().next().unwrap();
    assert_eq!(report.files_removed, 1);
    assert!(!env.destination.join("nvim/init.lua").exists());
    assert!(env.destination.join("nvim/lua/plugins.lua").exists());
}

#[test]
#[serial]
fn test_second_refresh_is_a_noop() {
    let env = TestEnvironment::new();
    env.create_dotfiles(".config/fish", &[("config.fish", "set -x EDITOR nvim")]);
    env.create_dotfiles(".config/git", &[("config", "[user]"), ("ignore", "target/")]);
    let engine = env.engine();
    engine.validate_and_sync("~/.config/fish").unwrap();
    engine.validate_and_sync("~/.config/git").unwrap();

    let summary = engine.refresh_all().unwrap();

    assert_eq!(summary.total(), 2);
    for (path, report) in summary.succeeded() {
        assert!(report.is_noop(), "{} was not a no-op: {:?}", path, report);
    }
}

#[test]
#[serial]
fn test_refresh_copies_only_changed_files() {
    let env = TestEnvironment::new();
    let kitty = env.create_dotfiles(
        ".config/kitty",
        &[("kitty.conf", "font_size 12"), ("theme.conf", "background #000")],
    );
    let engine = env.engine();
    engine.validate_and_sync("~/.config/kitty").unwrap();

    let untouched = env.destination.join("kitty/theme.conf");
    let before = FileTime::from_last_modification_time(&std::fs::metadata(&untouched).unwrap());

    write_file(&kitty.join("kitty.conf"), "font_size 14");
    filetime::set_file_mtime(
        kitty.join("kitty.conf"),
        FileTime::from_unix_time(before.unix_seconds() + 60, 0),
    )
    .unwrap();

    let summary = engine.refresh_all().unwrap();
    let (_, report) = summary.succeeded().next().unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(report.files_unchanged, 1);
    assert_eq!(
        std::fs::read_to_string(env.destination.join("kitty/kitty.conf")).unwrap(),
        "font_size 14"
    );
    let after = FileTime::from_last_modification_time(&std::fs::metadata(&untouched).unwrap());
    assert_eq!(before, after);
}

#[test]
#[serial]
fn test_refresh_reports_missing_source_and_continues() {
    let env = TestEnvironment::new();
    let alacritty = env.create_dotfiles(".config/alacritty", &[("alacritty.toml", "")]);
    env.create_dotfiles(".config/zellij", &[("config.kdl", "")]);
    let engine = env.engine();
    engine.validate_and_sync("~/.config/alacritty").unwrap();
    engine.validate_and_sync("~/.config/zellij").unwrap();

    std::fs::remove_dir_all(&alacritty).unwrap();
    let summary = engine.refresh_all().unwrap();

    assert_eq!(summary.failed_count(), 1);
    let (path, err) = summary.failed().next().unwrap();
    assert_eq!(path, "~/.config/alacritty");
    assert!(matches!(err, Error::NotFound { .. }));
    // The mirror of a vanished source is left in place
    assert!(env.destination.join("alacritty/alacritty.toml").exists());
}

#[test]
#[serial]
fn test_add_rejects_files_and_missing_paths() {
    let env = TestEnvironment::new();
    write_file(&env.home.join(".bashrc"), "export PATH");
    let engine = env.engine();

    assert!(matches!(
        engine.validate_and_sync("~/.bashrc"),
        Err(Error::InvalidKind { .. })
    ));
    assert!(matches!(
        engine.validate_and_sync("~/.config/missing"),
        Err(Error::NotFound { .. })
    ));
    assert!(!engine.registry().path().exists());
}

#[test]
fn test_sync_dir_with_fixture_tree() {
    let source = assert_fs::TempDir::new().unwrap();
    let dest = assert_fs::TempDir::new().unwrap();
    source.child("starship.toml").write_str("add_newline = false").unwrap();
    source.child("themes/dark.toml").write_str("[palette]").unwrap();
    dest.child("stale.toml").write_str("old").unwrap();
    dest.child("gone/leftover").write_str("old").unwrap();

    let report = sync_dir(source.path(), dest.path()).unwrap();

    assert_eq!(report.files_copied, 2);
    assert_eq!(report.files_removed, 2);
    dest.child("starship.toml").assert("add_newline = false");
    dest.child("themes/dark.toml").assert(predicate::path::is_file());
    dest.child("stale.toml").assert(predicate::path::missing());
    dest.child("gone").assert(predicate::path::missing());
}

#[test]
fn test_registry_round_trip() {
    let temp = assert_fs::TempDir::new().unwrap();
    let registry = Registry::new(temp.child("file_paths.json").path());

    registry.track("~/.config/nvim/").unwrap();
    registry.track("~/.config/./kitty").unwrap();
    registry.track("~/.config/nvim").unwrap();

    assert_eq!(
        registry.tracked_paths().unwrap(),
        vec!["~/.config/kitty".to_string(), "~/.config/nvim".to_string()]
    );
    temp.child("file_paths.json")
        .assert(predicate::str::contains("\"~/.config/kitty\": true"));
}

#[test]
fn test_tree_of_one_directory_with_two_files() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("nvim/init.lua").touch().unwrap();
    temp.child("nvim/lazy.lua").touch().unwrap();

    let mut root = build_tree(temp.path());
    assert_eq!(visible_nodes(&root).len(), 1);

    root.set_expanded_recursive(true);
    let labels: Vec<&str> = visible_nodes(&root)
        .iter()
        .skip(1)
        .map(|node| node.label.as_str())
        .collect();
    assert_eq!(labels, vec!["nvim", "init.lua", "lazy.lua"]);
}

#[quickcheck]
fn prop_second_sync_does_nothing(files: Vec<(u8, Vec<u8>)>) -> bool {
    let source = tempfile::TempDir::new().unwrap();
    let dest = tempfile::TempDir::new().unwrap();
    for (name, content) in &files {
        std::fs::write(source.path().join(format!("file-{}", name)), content).unwrap();
    }

    let first = sync_dir(source.path(), dest.path()).unwrap();
    let second = sync_dir(source.path(), dest.path()).unwrap();

    let distinct = files
        .iter()
        .map(|(name, _)| *name)
        .collect::<std::collections::HashSet<_>>()
        .len();
    first.files_copied == distinct && second.is_noop() && second.files_unchanged == distinct
}
