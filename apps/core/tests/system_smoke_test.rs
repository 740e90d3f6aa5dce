use appctl_core::config::Config;
use appctl_core::contract::{CoreRequest, ListRunningRequest};
use appctl_core::discovery::{DiscoveryProvider, SkipReason, SourceResult};
use appctl_core::engine::AppEngine;
use appctl_core::model::Query;
use appctl_core::package_index::SystemPackageIndex;
use appctl_core::transport::TransportResponse;

fn offline_engine() -> AppEngine {
    AppEngine::new(Config {
        launcher_roots: Vec::new(),
        install_roots: Vec::new(),
        search_path: Vec::new(),
        ..Config::default()
    })
    .expect("engine should initialize")
}

#[test]
fn live_process_table_lists_something() {
    let engine = offline_engine();
    let request = CoreRequest::ListRunning(ListRunningRequest { limit: Some(500) });

    match appctl_core::transport::handle_request(&engine, request) {
        TransportResponse::Ok { response } => assert!(response.succeeded()),
        other => panic!("unexpected transport response: {other:?}"),
    }
    assert!(!engine.running_applications(500).is_empty());
}

#[cfg(not(target_os = "windows"))]
#[test]
fn package_registry_is_skipped_off_windows() {
    let index = SystemPackageIndex::system();
    let query = Query::parse("anything").unwrap();
    assert_eq!(
        index.search(&query),
        SourceResult::Skipped(SkipReason::UnsupportedPlatform)
    );
}

#[cfg(target_os = "windows")]
#[test]
fn windows_registry_smoke_resolves_installed_software() {
    if std::env::var("APPCTL_SYSTEM_SMOKE").as_deref() != Ok("1") {
        eprintln!("skipping windows registry smoke (set APPCTL_SYSTEM_SMOKE=1 to enable)");
        return;
    }

    let index = SystemPackageIndex::system();
    let query = Query::parse("microsoft").unwrap();
    match index.search(&query) {
        SourceResult::Found(candidates) => {
            eprintln!("registry produced {} candidates", candidates.len())
        }
        SourceResult::Skipped(reason) => {
            assert!(!matches!(reason, SkipReason::UnsupportedPlatform))
        }
    }

    let engine = AppEngine::new(Config::default()).expect("engine should initialize");
    assert!(engine.resolve("notepad").is_some());
}
