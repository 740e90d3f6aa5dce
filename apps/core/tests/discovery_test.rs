mod common;

use std::time::Duration;

use appctl_core::discovery::{DiscoveryProvider, SkipReason, SourceResult};
use appctl_core::fs_index::FilesystemIndex;
use appctl_core::model::{CandidateSource, Query, Score};
use appctl_core::package_index::{
    candidates_for_entry, FixedPackageSource, PackageEntry, SystemPackageIndex,
};
use appctl_core::shortcut_index::ShortcutIndex;
use common::touch_executable;

#[test]
fn display_icon_and_install_dir_both_yield_candidates() {
    let root = tempfile::tempdir().unwrap();
    let main_exe = touch_executable(root.path(), "VideoLAN/VLC/vlc.exe");
    let icon_exe = touch_executable(root.path(), "VideoLAN/VLC/bin/vlc-icon.exe");
    touch_executable(root.path(), "VideoLAN/VLC/uninstall.exe");

    let entry = PackageEntry {
        display_name: "VLC media player".into(),
        install_location: Some(main_exe.parent().unwrap().to_string_lossy().into_owned()),
        display_icon: Some(format!("\"{}\",0", icon_exe.display())),
    };

    let candidates = candidates_for_entry(&Query::parse("vlc").unwrap(), &entry);
    let paths: Vec<_> = candidates.iter().map(|c| c.path.clone()).collect();
    assert_eq!(paths, vec![main_exe, icon_exe]);
    assert!(candidates
        .iter()
        .all(|c| c.score == Score::PARTIAL && c.source == CandidateSource::Registry));
}

#[test]
fn unrelated_registry_entries_contribute_nothing() {
    let index = SystemPackageIndex::new(Box::new(FixedPackageSource::new(vec![PackageEntry {
        display_name: "Git".into(),
        install_location: None,
        display_icon: None,
    }])));

    let result = index.search(&Query::parse("blender").unwrap());
    assert_eq!(result, SourceResult::Found(Vec::new()));
}

#[test]
fn missing_launcher_directories_skip_the_source() {
    let root = tempfile::tempdir().unwrap();
    let index = ShortcutIndex::new(vec![root.path().join("absent")]);

    assert!(matches!(
        index.search(&Query::parse("anything").unwrap()),
        SourceResult::Skipped(SkipReason::Unavailable(_))
    ));
}

#[test]
fn hidden_directories_are_never_walked() {
    let root = tempfile::tempdir().unwrap();
    touch_executable(root.path(), ".hidden/zqxsecret.exe");
    let visible = touch_executable(root.path(), "visible/zqxsecret-tool.exe");

    let index = FilesystemIndex::new(
        vec![root.path().to_path_buf()],
        5,
        Vec::new(),
        Duration::from_secs(8),
    );
    let found = index.search(&Query::parse("zqxsecret").unwrap()).into_candidates();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path, visible);
}
