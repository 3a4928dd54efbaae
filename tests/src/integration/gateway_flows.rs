//! # Gateway Flows
//!
//! Wallet → bus → signing request handler → QR protocol → simulated device →
//! camera → bus → wallet.

use super::fixtures::{keystone_request, signer_request, Rig, DEVICE_SECRET};
use sc_01_fountain_qr::{CodecConfig, SigningNotice};
use sc_03_qr_signing::{simulated_signature, SimulatedKeystone, SimulatedSigner};
use shared_bus::Method;
use shared_types::ipc::KeystoneDataType;
use shared_types::{CancelToken, SigningError, SigningOutcome};
use signing_runtime::CoordinatorConfig;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(60);

fn small_fragments() -> CoordinatorConfig {
    CoordinatorConfig {
        codec: CodecConfig {
            fragment_size: 80,
            fountain_fragment_len: 40,
            ..CodecConfig::default()
        },
        ..CoordinatorConfig::default()
    }
}

fn signer_device(rig: &Rig) -> SimulatedSigner {
    SimulatedSigner::new(
        rig.devices.surface.clone(),
        rig.devices.feed.clone(),
        DEVICE_SECRET,
        rig.config.codec.fixed_interval(),
    )
}

fn keystone_device(rig: &Rig) -> SimulatedKeystone {
    SimulatedKeystone::new(
        rig.devices.surface.clone(),
        rig.devices.feed.clone(),
        DEVICE_SECRET,
        rig.config.codec.fountain_fragment_len,
    )
}

#[tokio::test(start_paused = true)]
async fn signer_round_trip_over_rotating_frames() {
    let rig = Rig::start(small_fragments());
    let request = signer_request(200);
    let device = signer_device(&rig);
    let device = tokio::spawn(async move { device.serve_once().await });

    let outcome = timeout(
        WAIT,
        rig.runtime.remote().sign_with_signer(&CancelToken::new(), request.clone()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        outcome,
        SigningOutcome::Completed(simulated_signature(DEVICE_SECRET, &request.transaction.body))
    );
    assert_eq!(device.await.unwrap().unwrap(), request);
    // 200 bytes of hex alone need several 80-character chunks.
    assert!(rig.devices.surface.frame_count() > 3);
    assert_eq!(rig.devices.surface.notices().last(), Some(&SigningNotice::Completed));
    assert_eq!(rig.runtime.bus().subscriber_count(Method::Response), 0);
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn wrong_code_is_reported_and_rescanned() {
    let rig = Rig::start(CoordinatorConfig::default());
    rig.devices.feed.show("UR:CRYPTO-ACCOUNT/0011223344");
    rig.devices.feed.show("not even a code");
    let device = signer_device(&rig);
    let device = tokio::spawn(async move { device.serve_once().await });

    let request = signer_request(16);
    let outcome = timeout(
        WAIT,
        rig.runtime.remote().sign_with_signer(&CancelToken::new(), request.clone()),
    )
    .await
    .unwrap()
    .unwrap();
    device.await.unwrap().unwrap();

    assert!(outcome.completed().is_some());
    let wrong_codes = rig
        .devices
        .surface
        .notices()
        .iter()
        .filter(|n| matches!(n, SigningNotice::WrongCode { .. }))
        .count();
    assert_eq!(wrong_codes, 2);
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn keystone_round_trip_with_fountain_frames() {
    let rig = Rig::start(small_fragments());
    let request = keystone_request(600);
    let device = keystone_device(&rig);
    let device = tokio::spawn(async move { device.serve_once().await });

    let outcome = timeout(
        WAIT,
        rig.runtime.remote().sign_with_keystone(&CancelToken::new(), request.clone()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        outcome,
        SigningOutcome::Completed(simulated_signature(DEVICE_SECRET, &request.sign_data))
    );
    assert_eq!(device.await.unwrap().unwrap(), request);
    assert!(rig
        .devices
        .surface
        .frames()
        .iter()
        .all(|frame| frame.starts_with("UR:TON-SIGN-REQUEST/")));
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn keystone_proof_request() {
    let rig = Rig::start(CoordinatorConfig::default());
    let mut request = keystone_request(48);
    request.data_type = KeystoneDataType::SignProof;
    let device = keystone_device(&rig);
    let device = tokio::spawn(async move { device.serve_once().await });

    let outcome = timeout(
        WAIT,
        rig.runtime.remote().sign_with_keystone(&CancelToken::new(), request.clone()),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(outcome.completed().is_some());
    assert_eq!(device.await.unwrap().unwrap().data_type, KeystoneDataType::SignProof);
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn operator_closing_the_modal_cancels_and_stops_frames() {
    let rig = Rig::start(small_fragments());
    let remote = rig.runtime.remote();
    let request = signer_request(300);

    // Nobody answers: the QR keeps rotating until the operator cancels.
    let pending = tokio::spawn(async move {
        remote.sign_with_signer(&CancelToken::new(), request).await
    });
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(rig.devices.surface.frame_count() > 5);
    assert!(rig.runtime.cancel_current());

    let outcome = timeout(WAIT, pending).await.unwrap().unwrap().unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(rig.devices.surface.notices().last(), Some(&SigningNotice::Cancelled));

    // The animation is stopped: no frames after cancellation.
    let frames = rig.devices.surface.frame_count();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(rig.devices.surface.frame_count(), frames);
    assert_eq!(rig.runtime.bus().subscriber_count(Method::Response), 0);
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn wallet_side_cancel_resolves_immediately() {
    let rig = Rig::start(CoordinatorConfig::default());
    let remote = rig.runtime.remote();
    let cancel = CancelToken::new();

    let pending = {
        let cancel = cancel.clone();
        tokio::spawn(async move { remote.sign_with_keystone(&cancel, keystone_request(32)).await })
    };
    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();

    let outcome = timeout(WAIT, pending).await.unwrap().unwrap().unwrap();
    assert_eq!(outcome, SigningOutcome::Cancelled);

    // The UI side is still showing the request until the modal closes.
    assert!(rig.runtime.cancel_current());
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn camera_failure_surfaces_as_transport_unavailable() {
    let rig = Rig::start(CoordinatorConfig::default());
    rig.devices
        .feed
        .fail(sc_02_scanner_session::ReaderError::Unavailable("camera permission denied".into()));

    let result = timeout(
        WAIT,
        rig.runtime.remote().sign_with_signer(&CancelToken::new(), signer_request(8)),
    )
    .await
    .unwrap();

    match result {
        Err(SigningError::TransportUnavailable(reason)) => assert!(reason.contains("camera")),
        other => panic!("expected TransportUnavailable, got {other:?}"),
    }
    rig.runtime.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn requests_are_served_one_at_a_time() {
    let rig = Rig::start(CoordinatorConfig::default());
    let remote = rig.runtime.remote();

    // A Ledger batch and a Signer request in flight together.
    let ledger = {
        let remote = remote.clone();
        tokio::spawn(async move {
            remote
                .sign_with_ledger(
                    &CancelToken::new(),
                    shared_types::DerivationPath::ton_account(0),
                    super::fixtures::transactions(2),
                )
                .await
        })
    };
    let device = signer_device(&rig);
    let device = tokio::spawn(async move { device.serve_once().await });
    let request = signer_request(8);
    let signer_cancel = CancelToken::new();
    let signer = remote.sign_with_signer(&signer_cancel, request.clone());

    let (ledger, signer) = tokio::join!(timeout(WAIT, ledger), timeout(WAIT, signer));
    assert_eq!(ledger.unwrap().unwrap().unwrap().completed().unwrap().len(), 2);
    assert_eq!(
        signer.unwrap().unwrap(),
        SigningOutcome::Completed(simulated_signature(DEVICE_SECRET, &request.transaction.body))
    );
    device.await.unwrap().unwrap();
    rig.runtime.shutdown().await;
}
