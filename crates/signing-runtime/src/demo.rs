//! # Demo Round Trips
//!
//! Runs one request per device kind through the bus against simulated
//! hardware: Signer app, Keystone, a Ledger transaction batch and a Ledger
//! TON proof.

use crate::container::{CoordinatorConfig, Peripherals, SigningRuntime};
use anyhow::{anyhow, Context, Result};
use sc_01_fountain_qr::RecordingSurface;
use sc_02_scanner_session::{ChannelReader, QrFeed};
use sc_03_qr_signing::{SimulatedKeystone, SimulatedSigner};
use sc_04_ledger_transport::SimulatedLedger;
use shared_types::ipc::{KeystoneDataType, KeystoneRequest, Network, SignerRequest};
use shared_types::{
    CancelToken, DerivationPath, Signature, SignedProof, SigningOutcome, TonProofRequest,
    Transaction,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Secret shared by the simulated devices.
pub const DEMO_SECRET: &[u8] = b"signing-runtime-demo";

/// Simulated peripherals, kept so the demo can drive the device side.
pub struct SimulatedPeripherals {
    pub surface: Arc<RecordingSurface>,
    pub feed: QrFeed,
    pub ledger: Arc<SimulatedLedger>,
    reader: Option<ChannelReader>,
}

impl SimulatedPeripherals {
    pub fn new() -> Self {
        let (feed, reader) = ChannelReader::channel();
        Self {
            surface: Arc::new(RecordingSurface::new()),
            feed,
            ledger: Arc::new(SimulatedLedger::new(DEMO_SECRET.to_vec()).open_app_after(2)),
            reader: Some(reader),
        }
    }

    /// Hand the devices to the runtime. Only the first call gets the camera.
    pub fn peripherals(&mut self) -> Result<Peripherals> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| anyhow!("simulated camera already attached"))?;
        Ok(Peripherals {
            surface: self.surface.clone(),
            camera: Arc::new(reader),
            ledger: self.ledger.clone(),
        })
    }
}

impl Default for SimulatedPeripherals {
    fn default() -> Self {
        Self::new()
    }
}

/// What each round trip resolved to.
#[derive(Debug)]
pub struct DemoReport {
    pub signer: SigningOutcome<Signature>,
    pub keystone: SigningOutcome<Signature>,
    pub ledger: SigningOutcome<Vec<Signature>>,
    pub proof: SigningOutcome<SignedProof>,
}

impl DemoReport {
    /// Returns true if every request completed.
    pub fn all_completed(&self) -> bool {
        !self.signer.is_cancelled()
            && !self.keystone.is_cancelled()
            && !self.ledger.is_cancelled()
            && !self.proof.is_cancelled()
    }
}

/// Run the four round trips in sequence.
pub async fn run_demo(
    runtime: &SigningRuntime,
    devices: &SimulatedPeripherals,
    config: &CoordinatorConfig,
) -> Result<DemoReport> {
    let remote = runtime.remote();
    let cancel = CancelToken::new();
    let path = DerivationPath::ton_account(0);

    // Signer app over fixed-interval frames.
    devices.surface.clear();
    let signer = SimulatedSigner::new(
        devices.surface.clone(),
        devices.feed.clone(),
        DEMO_SECRET,
        config.codec.fixed_interval(),
    );
    let device = tokio::spawn(async move { signer.serve_once().await });
    let request = SignerRequest {
        transaction: Transaction::new(vec![0xab; 300]),
        public_key: [7; 32],
        version: "v4R2".to_string(),
        network: Network::Mainnet,
    };
    let signer = remote
        .sign_with_signer(&cancel, request)
        .await
        .context("Signer round trip failed")?;
    device.await?.context("simulated Signer failed")?;
    log_outcome("signer", &signer, |s| hex::encode(&s[..8]));

    // Keystone over fountain frames.
    devices.surface.clear();
    let keystone = SimulatedKeystone::new(
        devices.surface.clone(),
        devices.feed.clone(),
        DEMO_SECRET,
        config.codec.fountain_fragment_len,
    );
    let device = tokio::spawn(async move { keystone.serve_once().await });
    let request = KeystoneRequest {
        request_id: Uuid::new_v4(),
        sign_data: vec![0x5c; 512],
        data_type: KeystoneDataType::Transaction,
        derivation_path: path.clone(),
        address: "0:demo".to_string(),
        origin: "signing-runtime".to_string(),
    };
    let keystone = remote
        .sign_with_keystone(&cancel, request)
        .await
        .context("Keystone round trip failed")?;
    device.await?.context("simulated Keystone failed")?;
    log_outcome("keystone", &keystone, |s| hex::encode(&s[..8]));

    // Ledger batch.
    let transactions = (0..3u8).map(|i| Transaction::new(vec![i; 32])).collect();
    let ledger = remote
        .sign_with_ledger(&cancel, path.clone(), transactions)
        .await
        .context("Ledger round trip failed")?;
    log_outcome("ledger", &ledger, |s| format!("{} signatures", s.len()));

    // Ledger TON proof.
    let proof = TonProofRequest {
        domain: "dapp.example".to_string(),
        timestamp: 1_700_000_000,
        payload: "demo-nonce".to_string(),
    };
    let proof = remote
        .sign_proof_with_ledger(&cancel, path, proof)
        .await
        .context("Ledger proof round trip failed")?;
    log_outcome("ledger", &proof, |p| p.request.domain.clone());

    Ok(DemoReport {
        signer,
        keystone,
        ledger,
        proof,
    })
}

fn log_outcome<T>(device: &str, outcome: &SigningOutcome<T>, describe: impl Fn(&T) -> String) {
    match outcome {
        SigningOutcome::Completed(value) => info!(device, result = %describe(value), "Round trip completed"),
        SigningOutcome::Cancelled => info!(device, "Round trip cancelled"),
    }
}
