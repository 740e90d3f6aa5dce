mod common;

use std::sync::Arc;
use std::time::Duration;

use appctl_core::contract::{AppRequest, CoreRequest, CoreResponse, ListRunningRequest};
use appctl_core::transport::{ErrorCode, TransportResponse};
use appctl_core::worker::EngineWorker;
use common::{empty_aliases, engine_with, FakeProcessTable, ScriptedBackend};

fn worker() -> EngineWorker {
    let engine = engine_with(
        empty_aliases(),
        Vec::new(),
        Arc::new(ScriptedBackend {
            shell: Ok(()),
            ..ScriptedBackend::default()
        }),
        Arc::new(FakeProcessTable::with(&[(3, "spotify.exe"), (4, "zed.exe")])),
    );
    EngineWorker::spawn(Arc::new(engine)).unwrap()
}

#[test]
fn submitted_requests_are_answered_on_their_own_channel() {
    let worker = worker();

    let running = worker
        .submit(CoreRequest::ListRunning(ListRunningRequest { limit: None }))
        .unwrap();
    let launch = worker
        .submit(CoreRequest::Launch(AppRequest {
            name: "spotify".into(),
        }))
        .unwrap();

    match launch.recv_timeout(Duration::from_secs(5)).unwrap() {
        TransportResponse::Ok {
            response: CoreResponse::Launch(response),
        } => assert!(response.launched),
        other => panic!("unexpected launch reply: {other:?}"),
    }
    match running.recv_timeout(Duration::from_secs(5)).unwrap() {
        TransportResponse::Ok {
            response: CoreResponse::ListRunning(response),
        } => assert_eq!(
            response.applications,
            vec!["spotify".to_string(), "zed".to_string()]
        ),
        other => panic!("unexpected list reply: {other:?}"),
    }
}

#[test]
fn errors_come_back_as_transport_errors() {
    let worker = worker();
    let reply = worker
        .call(CoreRequest::Terminate(AppRequest { name: "".into() }))
        .unwrap();

    match reply {
        TransportResponse::Err { error } => assert_eq!(error.code, ErrorCode::InvalidRequest),
        other => panic!("expected error reply, got {other:?}"),
    }
}

#[test]
fn dropping_the_worker_joins_its_thread() {
    let worker = worker();
    let pending = worker
        .submit(CoreRequest::Restart(AppRequest {
            name: "zed".into(),
        }))
        .unwrap();
    drop(worker);

    // Queued work is drained before the thread exits.
    assert!(matches!(
        pending.try_recv(),
        Ok(TransportResponse::Ok { .. })
    ));
}
