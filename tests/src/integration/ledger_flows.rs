//! # Ledger Flows
//!
//! Ledger requests sent over the bus, served by the runtime's Ledger signer
//! against the simulated device.

use super::fixtures::{proof_request, transactions, Rig};
use sc_04_ledger_transport::{ConnectStep, LedgerCall, LedgerConfig, RetryPolicy, SessionSnapshot, TransportError};
use shared_bus::Method;
use shared_types::{CancelToken, DerivationPath, Signature, SigningError, SigningOutcome};
use signing_runtime::CoordinatorConfig;
use signing_telemetry::LEDGER_RECONNECTS;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(30);

async fn wait_for(
    rx: &mut watch::Receiver<SessionSnapshot>,
    pred: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    timeout(WAIT, async {
        loop {
            rx.changed().await.unwrap();
            let snapshot = *rx.borrow_and_update();
            if pred(&snapshot) {
                return snapshot;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn three_transactions_walk_the_state_sequence() {
    let rig = Rig::start(CoordinatorConfig::default());
    let device = rig.ledger_device();
    let mut rx = rig.runtime.ledger().subscribe();

    let collector = tokio::spawn(async move {
        let mut seen: Vec<(ConnectStep, usize)> = Vec::new();
        while rx.changed().await.is_ok() {
            let snapshot = *rx.borrow_and_update();
            let pair = (snapshot.step, snapshot.signing_index);
            if seen.last() != Some(&pair) {
                seen.push(pair);
            }
            if snapshot.step == ConnectStep::AllCompleted {
                break;
            }
        }
        seen
    });

    let batch = transactions(3);
    let signatures = timeout(
        WAIT,
        rig.runtime
            .remote()
            .sign_with_ledger(&CancelToken::new(), DerivationPath::ton_account(0), batch.clone()),
    )
    .await
    .unwrap()
    .unwrap()
    .completed()
    .unwrap();

    let expected: Vec<Signature> = batch.iter().map(|tx| device.signature_for(&tx.body)).collect();
    assert_eq!(signatures, expected);
    assert_eq!(
        collector.await.unwrap(),
        vec![
            (ConnectStep::Connect, 0),
            (ConnectStep::OpenTon, 0),
            (ConnectStep::ConfirmTx, 0),
            (ConnectStep::ConfirmTx, 1),
            (ConnectStep::ConfirmTx, 2),
            (ConnectStep::AllCompleted, 3),
        ]
    );
    // The simulated app opens on the third probe.
    assert_eq!(device.count(LedgerCall::ProbeApp), 3);
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rejection_on_device_resolves_as_cancelled() {
    let rig = Rig::start(CoordinatorConfig::default());
    let device = rig.ledger_device();
    device.fail_after(LedgerCall::SignTransaction, 1, TransportError::status(0x6985));

    let outcome = timeout(
        WAIT,
        rig.runtime
            .remote()
            .sign_with_ledger(&CancelToken::new(), DerivationPath::ton_account(0), transactions(3)),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome, SigningOutcome::Cancelled);
    // Never retried, and the third transaction is never sent.
    assert_eq!(device.count(LedgerCall::SignTransaction), 2);
    assert_eq!(device.count(LedgerCall::Connect), 1);
    assert_eq!(rig.runtime.bus().subscriber_count(Method::Response), 0);
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_retry_keeps_collected_signatures() {
    let rig = Rig::start(CoordinatorConfig::default());
    let device = rig.ledger_device();
    device.fail_after(
        LedgerCall::SignTransaction,
        2,
        TransportError::Disconnected("cable pulled".into()),
    );
    let ledger = rig.runtime.ledger();
    let mut rx = ledger.subscribe();
    let reconnects_before = LEDGER_RECONNECTS.get();

    let remote = rig.runtime.remote();
    let batch = transactions(4);
    let request = {
        let batch = batch.clone();
        tokio::spawn(async move {
            remote
                .sign_with_ledger(&CancelToken::new(), DerivationPath::ton_account(0), batch)
                .await
        })
    };

    let errored = wait_for(&mut rx, |s| s.is_errored).await;
    assert_eq!(errored.step, ConnectStep::ConfirmTx);
    assert_eq!(errored.signing_index, 2);
    assert_eq!(errored.total, 4);
    ledger.retry();

    let restarted = wait_for(&mut rx, |s| s.step == ConnectStep::Connect).await;
    assert_eq!(restarted.signing_index, 2);
    assert!(!restarted.is_errored);

    let signatures = timeout(WAIT, request).await.unwrap().unwrap().unwrap().completed().unwrap();
    let expected: Vec<Signature> = batch.iter().map(|tx| device.signature_for(&tx.body)).collect();
    assert_eq!(signatures, expected);
    assert_eq!(device.count(LedgerCall::Connect), 2);
    // Other tests share the global registry, so only a lower bound holds.
    assert!(LEDGER_RECONNECTS.get() >= reconnects_before + 1.0);
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn operator_cancel_while_errored() {
    let rig = Rig::start(CoordinatorConfig::default());
    rig.ledger_device()
        .fail_on(LedgerCall::Connect, TransportError::Disconnected("bluetooth off".into()));
    let mut rx = rig.runtime.ledger().subscribe();

    let remote = rig.runtime.remote();
    let request = tokio::spawn(async move {
        remote
            .sign_proof_with_ledger(&CancelToken::new(), DerivationPath::ton_account(0), proof_request())
            .await
    });

    wait_for(&mut rx, |s| s.is_errored).await;
    assert!(rig.runtime.cancel_current());

    let outcome = timeout(WAIT, request).await.unwrap().unwrap().unwrap();
    assert!(outcome.is_cancelled());
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn app_never_opening_fails_as_unavailable() {
    let config = CoordinatorConfig {
        ledger: LedgerConfig {
            readiness: RetryPolicy {
                max_attempts: 2,
                initial_backoff_ms: 100,
                max_backoff_ms: 100,
            },
            retry_wait_ms: 0,
        },
        ..CoordinatorConfig::default()
    };
    // The simulated app needs three probes; the policy allows two.
    let rig = Rig::start(config);

    let result = timeout(
        WAIT,
        rig.runtime
            .remote()
            .sign_with_ledger(&CancelToken::new(), DerivationPath::ton_account(0), transactions(1)),
    )
    .await
    .unwrap();

    assert!(matches!(result, Err(SigningError::TransportUnavailable(_))));
    assert_eq!(rig.ledger_device().count(LedgerCall::SignTransaction), 0);
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn proof_over_the_bus() {
    let rig = Rig::start(CoordinatorConfig::default());
    let path = DerivationPath::ton_account(3);

    let signed = timeout(
        WAIT,
        rig.runtime
            .remote()
            .sign_proof_with_ledger(&CancelToken::new(), path.clone(), proof_request()),
    )
    .await
    .unwrap()
    .unwrap()
    .completed()
    .unwrap();

    let device = rig.ledger_device();
    assert_eq!(signed.request, proof_request());
    assert_eq!(
        signed.signature,
        device.signature_for(&sc_04_ledger_transport::SimulatedLedger::proof_message(
            &path,
            &proof_request()
        ))
    );
    rig.runtime.shutdown().await;
}
