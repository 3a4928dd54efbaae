//! # Scan Sessions
//!
//! Correlation isolation and cancellation across the scanner session manager,
//! the camera bridge and the bus.

use parking_lot::Mutex;
use sc_02_scanner_session::{CameraBridge, ScanError, ScannerSessionManager, ScriptedReader};
use shared_bus::{BusMessage, CorrelationBus, Method};
use shared_types::ipc::{ResponseError, ResponsePayload};
use shared_types::{CancelToken, CorrelationId, SessionContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

type Received = Arc<Mutex<Vec<(u64, String)>>>;

fn recorder(tag: u64, into: &Received) -> impl Fn(Result<ResponsePayload, ResponseError>) + Send + Sync + 'static {
    let into = Arc::clone(into);
    move |result| {
        let value = match result {
            Ok(ResponsePayload::Scanned(value)) => value,
            other => format!("{other:?}"),
        };
        into.lock().push((tag, value));
    }
}

fn scanned(id: u64, value: &str) -> BusMessage {
    BusMessage::response(CorrelationId(id), Ok(ResponsePayload::Scanned(value.to_string())))
}

#[test]
fn scenario_c_concurrent_sessions_only_see_their_response() {
    let bus = Arc::new(CorrelationBus::new());
    let scanner = ScannerSessionManager::new(bus.clone());
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    let first = scanner.request_scan(recorder(1001, &received));
    let second = scanner.request_scan(recorder(1002, &received));
    first.trigger_as(CorrelationId(1001));
    second.trigger_as(CorrelationId(1002));
    assert_eq!(bus.subscriber_count(Method::Response), 2);

    bus.emit(scanned(1002, "for-1002"));
    assert_eq!(*received.lock(), vec![(1002, "for-1002".to_string())]);
    assert_eq!(first.pending(), Some(CorrelationId(1001)));
    assert_eq!(second.pending(), None);

    bus.emit(scanned(1001, "for-1001"));
    assert_eq!(
        *received.lock(),
        vec![
            (1002, "for-1002".to_string()),
            (1001, "for-1001".to_string())
        ]
    );
    assert_eq!(bus.subscriber_count(Method::Response), 0);
}

#[test]
fn stale_and_foreign_responses_are_ignored() {
    let bus = Arc::new(CorrelationBus::new());
    let scanner = ScannerSessionManager::new(bus.clone());
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    let trigger = scanner.request_scan(recorder(7, &received));
    let stale = trigger.trigger();
    let fresh = trigger.trigger();
    assert_ne!(stale, fresh);

    // A late answer to the replaced scan, and one nobody asked for.
    bus.emit(scanned(stale.0, "stale"));
    bus.emit(scanned(fresh.0 + 1_000, "foreign"));
    assert!(received.lock().is_empty());

    bus.emit(scanned(fresh.0, "fresh"));
    assert_eq!(*received.lock(), vec![(7, "fresh".to_string())]);

    // Exactly once: a duplicate response is dropped.
    bus.emit(scanned(fresh.0, "fresh-again"));
    assert_eq!(received.lock().len(), 1);
}

#[test]
fn cancel_and_drop_leave_no_subscriber() {
    let bus = Arc::new(CorrelationBus::new());
    let scanner = ScannerSessionManager::new(bus.clone());
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    let trigger = scanner.request_scan(recorder(1, &received));
    let id = trigger.trigger();
    trigger.cancel();
    assert_eq!(bus.subscriber_count(Method::Response), 0);
    bus.emit(scanned(id.0, "late"));
    assert!(received.lock().is_empty());

    let trigger = scanner.request_scan(recorder(2, &received));
    trigger.trigger();
    drop(trigger);
    assert_eq!(bus.subscriber_count(Method::Response), 0);
}

#[tokio::test]
async fn async_scan_cancel_leaves_no_subscriber() {
    let bus = Arc::new(CorrelationBus::new());
    let scanner = ScannerSessionManager::new(bus.clone());
    let cancel = CancelToken::new();
    let ctx = SessionContext::with_cancel(bus.next_correlation_id(), cancel.clone());

    let task = {
        let scanner = scanner.clone();
        tokio::spawn(async move { scanner.scan(&ctx).await })
    };
    // Nobody answers the scan; wait until the session is listening.
    timeout(Duration::from_secs(5), async {
        while bus.subscriber_count(Method::Response) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    let result = timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert_eq!(result, Err(ScanError::Cancelled));
    assert_eq!(bus.subscriber_count(Method::Response), 0);
}

#[tokio::test]
async fn camera_bridge_answers_each_scan_by_id() {
    let bus = Arc::new(CorrelationBus::new());
    let reader = ScriptedReader::new(vec!["first".to_string(), "second".to_string()]);
    let camera = CameraBridge::new(bus.clone(), Arc::new(reader)).start();
    let scanner = ScannerSessionManager::new(bus.clone());

    let a = SessionContext::new(bus.next_correlation_id());
    let b = SessionContext::new(bus.next_correlation_id());
    let first = timeout(Duration::from_secs(5), scanner.scan(&a)).await.unwrap();
    let second = timeout(Duration::from_secs(5), scanner.scan(&b)).await.unwrap();

    assert_eq!(first.unwrap(), "first");
    assert_eq!(second.unwrap(), "second");

    // The script is exhausted: the camera reports it closed.
    let c = SessionContext::new(bus.next_correlation_id());
    let third = timeout(Duration::from_secs(5), scanner.scan(&c)).await.unwrap();
    assert!(third.is_err());

    camera.shutdown().await;
    assert_eq!(bus.subscriber_count(Method::Scan), 0);
    assert_eq!(bus.subscriber_count(Method::Response), 0);
}
