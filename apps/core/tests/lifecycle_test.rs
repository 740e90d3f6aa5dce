mod common;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use appctl_core::alias_index::{AliasIndex, AliasTable};
use appctl_core::controller::LaunchOutcome;
use appctl_core::discovery::StaticProvider;
use appctl_core::launcher::{LaunchError, LaunchMechanism};
use appctl_core::model::{Candidate, CandidateSource, Score};
use common::{empty_aliases, engine_with, FakeProcessTable, ScriptedBackend};
use pretty_assertions::assert_eq;

fn discovered(path: &str, source: CandidateSource) -> StaticProvider {
    StaticProvider::new(
        "fixture",
        vec![Candidate {
            score: Score::EXACT,
            path: PathBuf::from(path),
            source,
        }],
    )
}

#[test]
fn terminate_with_nothing_running_reports_false() {
    let processes = Arc::new(FakeProcessTable::with(&[(10, "notepad.exe"), (11, "svchost.exe")]));
    let engine = engine_with(
        empty_aliases(),
        Vec::new(),
        Arc::new(ScriptedBackend::default()),
        Arc::clone(&processes),
    );

    assert_eq!(engine.terminate("x"), (false, Vec::new()));
    assert!(processes.killed().is_empty());
}

#[test]
fn terminate_kills_alias_images_and_stem_matches() {
    let aliases = AliasIndex::new(
        AliasTable::new().with_process_names("obs", &["obs64.exe", "obs32.exe", "obs.exe"]),
        Vec::new(),
    );
    let processes = Arc::new(FakeProcessTable::with(&[
        (20, "OBS64.exe"),
        (21, "obs-browser-page.exe"),
        (22, "notepad.exe"),
    ]));
    let engine = engine_with(
        Arc::new(aliases),
        Vec::new(),
        Arc::new(ScriptedBackend::default()),
        Arc::clone(&processes),
    );

    let (any, killed) = engine.terminate("OBS");
    assert!(any);
    assert_eq!(killed, vec!["OBS64.exe".to_string(), "obs-browser-page.exe".to_string()]);
    assert_eq!(processes.killed(), vec![20, 21]);
}

#[test]
fn terminate_never_targets_own_process() {
    let own_pid = std::process::id();
    let processes = Arc::new(FakeProcessTable::with(&[(own_pid, "lifecycle_test.exe")]));
    let engine = engine_with(
        empty_aliases(),
        Vec::new(),
        Arc::new(ScriptedBackend::default()),
        Arc::clone(&processes),
    );

    assert_eq!(engine.terminate("lifecycle_test"), (false, Vec::new()));
}

#[test]
fn restart_of_stopped_application_still_launches() {
    let backend = Arc::new(ScriptedBackend {
        shell: Ok(()),
        ..ScriptedBackend::default()
    });
    let engine = engine_with(
        empty_aliases(),
        Vec::new(),
        Arc::clone(&backend),
        Arc::new(FakeProcessTable::default()),
    );

    assert!(engine.restart("notrunning"));
    assert_eq!(backend.calls(), vec!["shell:notrunning".to_string()]);
}

#[test]
fn restart_kills_running_match_before_launching() {
    let processes = Arc::new(FakeProcessTable::with(&[(40, "zed.exe"), (41, "notepad.exe")]));
    let backend = Arc::new(ScriptedBackend {
        shell: Ok(()),
        watch: Some(Arc::clone(&processes)),
        ..ScriptedBackend::default()
    });
    let engine = engine_with(
        empty_aliases(),
        Vec::new(),
        Arc::clone(&backend),
        Arc::clone(&processes),
    );

    assert!(engine.restart("zed"));
    assert_eq!(processes.killed(), vec![40]);
    assert_eq!(backend.calls(), vec!["shell:zed".to_string()]);
    assert_eq!(backend.running_at_call(), vec![vec![41]]);
}

#[test]
fn launch_prefers_command_search_path() {
    let backend = Arc::new(ScriptedBackend {
        on_path: HashMap::from([("code".to_string(), PathBuf::from("/usr/bin/code"))]),
        spawn: Ok(()),
        ..ScriptedBackend::default()
    });
    let engine = engine_with(
        empty_aliases(),
        vec![Box::new(discovered("/opt/code/code", CandidateSource::Filesystem))],
        Arc::clone(&backend),
        Arc::new(FakeProcessTable::default()),
    );

    let outcome = engine.try_launch("code").unwrap();
    assert_eq!(
        outcome,
        LaunchOutcome::Launched {
            mechanism: LaunchMechanism::CommandPath,
            target: "/usr/bin/code".into(),
        }
    );
    assert_eq!(backend.calls(), vec!["spawn:/usr/bin/code".to_string()]);
}

#[test]
fn resolved_shortcuts_use_shortcut_activation() {
    let backend = Arc::new(ScriptedBackend {
        shortcut: Ok(()),
        ..ScriptedBackend::default()
    });
    let engine = engine_with(
        empty_aliases(),
        vec![Box::new(discovered(
            "/menu/Spotify.desktop",
            CandidateSource::Shortcut,
        ))],
        Arc::clone(&backend),
        Arc::new(FakeProcessTable::default()),
    );

    assert!(engine.launch("spotify"));
    assert_eq!(backend.calls(), vec!["shortcut:/menu/Spotify.desktop".to_string()]);
}

#[test]
fn rejected_launch_falls_back_down_the_chain() {
    let backend = Arc::new(ScriptedBackend {
        spawn: Err(LaunchError::Rejected {
            mechanism: "spawn",
            target: "/opt/app/app".into(),
            message: "bad image".into(),
        }),
        document: Ok(()),
        ..ScriptedBackend::default()
    });
    let engine = engine_with(
        empty_aliases(),
        vec![Box::new(discovered("/opt/app/app", CandidateSource::Filesystem))],
        Arc::clone(&backend),
        Arc::new(FakeProcessTable::default()),
    );

    let outcome = engine.try_launch("app").unwrap();
    assert!(matches!(
        outcome,
        LaunchOutcome::Launched {
            mechanism: LaunchMechanism::OpenDocument,
            ..
        }
    ));
    assert_eq!(
        backend.calls(),
        vec![
            "spawn:/opt/app/app".to_string(),
            "shell:app".to_string(),
            "document:app".to_string(),
        ]
    );
}

#[test]
fn permission_denied_stops_the_chain() {
    let backend = Arc::new(ScriptedBackend {
        spawn: Err(LaunchError::PermissionDenied("/opt/app/app".into())),
        shell: Ok(()),
        ..ScriptedBackend::default()
    });
    let engine = engine_with(
        empty_aliases(),
        vec![Box::new(discovered("/opt/app/app", CandidateSource::Filesystem))],
        Arc::clone(&backend),
        Arc::new(FakeProcessTable::default()),
    );

    assert!(!engine.launch("app"));
    assert_eq!(backend.calls(), vec!["spawn:/opt/app/app".to_string()]);
}

#[test]
fn exhausted_chain_is_not_launched() {
    let backend = Arc::new(ScriptedBackend::default());
    let engine = engine_with(
        empty_aliases(),
        Vec::new(),
        Arc::clone(&backend),
        Arc::new(FakeProcessTable::default()),
    );

    assert_eq!(engine.try_launch("ghost").unwrap(), LaunchOutcome::NotLaunched);
    assert!(!engine.launch("ghost"));
}

#[test]
fn running_applications_are_distinct_and_limited() {
    let processes = Arc::new(FakeProcessTable::with(&[
        (1, "zed.exe"),
        (2, "Code.exe"),
        (3, "code.exe"),
        (4, "alacritty.exe"),
    ]));
    let engine = engine_with(
        empty_aliases(),
        Vec::new(),
        Arc::new(ScriptedBackend::default()),
        processes,
    );

    assert_eq!(
        engine.running_applications(10),
        vec!["alacritty".to_string(), "Code".to_string(), "zed".to_string()]
    );
    assert_eq!(engine.running_applications(1), vec!["alacritty".to_string()]);
}
