//! # Test Fixtures
//!
//! A fully wired runtime over simulated peripherals, plus request builders.

use sc_04_ledger_transport::SimulatedLedger;
use shared_types::ipc::{KeystoneDataType, KeystoneRequest, Network, SignerRequest};
use shared_types::{DerivationPath, TonProofRequest, Transaction};
use signing_runtime::{CoordinatorConfig, SigningRuntime, SimulatedPeripherals};
use std::sync::Arc;
use uuid::Uuid;

/// Secret used by every simulated device in these tests.
pub const DEVICE_SECRET: &[u8] = signing_runtime::demo::DEMO_SECRET;

/// A running coordinator and the devices attached to it.
pub struct Rig {
    pub runtime: SigningRuntime,
    pub devices: SimulatedPeripherals,
    pub config: CoordinatorConfig,
}

impl Rig {
    /// Start a coordinator with `config`. Must run inside a tokio runtime.
    pub fn start(config: CoordinatorConfig) -> Self {
        let mut devices = SimulatedPeripherals::new();
        let peripherals = match devices.peripherals() {
            Ok(peripherals) => peripherals,
            Err(e) => panic!("fresh peripherals: {e}"),
        };
        let runtime = SigningRuntime::start(&config, peripherals);
        Self {
            runtime,
            devices,
            config,
        }
    }

    /// The simulated Ledger.
    pub fn ledger_device(&self) -> Arc<SimulatedLedger> {
        self.devices.ledger.clone()
    }
}

/// A Signer request whose body is `len` bytes.
pub fn signer_request(len: usize) -> SignerRequest {
    SignerRequest {
        transaction: Transaction::new((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>()),
        public_key: [0x11; 32],
        version: "v4R2".to_string(),
        network: Network::Testnet,
    }
}

/// A Keystone transaction request over `len` bytes.
pub fn keystone_request(len: usize) -> KeystoneRequest {
    KeystoneRequest {
        request_id: Uuid::new_v4(),
        sign_data: (0..len).map(|i| (i * 7 % 256) as u8).collect(),
        data_type: KeystoneDataType::Transaction,
        derivation_path: DerivationPath::ton_account(0),
        address: "0:keystone-test".to_string(),
        origin: "sc-tests".to_string(),
    }
}

/// `n` distinct transactions.
pub fn transactions(n: u8) -> Vec<Transaction> {
    (0..n).map(|i| Transaction::new(vec![i; 16])).collect()
}

/// A TON proof request.
pub fn proof_request() -> TonProofRequest {
    TonProofRequest {
        domain: "dapp.example".to_string(),
        timestamp: 1_700_000_000,
        payload: "challenge".to_string(),
    }
}
