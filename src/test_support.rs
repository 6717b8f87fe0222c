// Shared fakes for unit tests

use async_trait::async_trait;
use axum::{http::StatusCode, routing::post, Json, Router};
use ethers::types::{Address, TxHash, U256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    error::{AppError, Result},
    integrations::wallet::WalletProvider,
    services::onchain::{GasSettings, KittenLedger},
};

pub const VALID_ADDRESS: &str = "0xABCDEF0123456789abcdef0123456789ABCDEF01";

pub fn valid_address() -> &'static str {
    VALID_ADDRESS
}

pub struct FakeLedger {
    signer: bool,
    balance: U256,
    kittens: U256,
    fail_reads: bool,
    fail_submit: Option<String>,
    submit_delay_ms: u64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    submitted: Mutex<Vec<(Address, u64, GasSettings)>>,
}

impl FakeLedger {
    pub const GAS_PRICE: u64 = 2_000_000_000;

    pub fn funded() -> Self {
        Self::with_balance(U256::exp10(18))
    }

    pub fn with_balance(balance: U256) -> Self {
        Self {
            signer: true,
            balance,
            kittens: U256::from(7u64),
            fail_reads: false,
            fail_submit: None,
            submit_delay_ms: 0,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn without_signer() -> Self {
        Self {
            signer: false,
            ..Self::funded()
        }
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_submit(mut self, message: &str) -> Self {
        self.fail_submit = Some(message.to_string());
        self
    }

    pub fn with_submit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.submit_delay_ms = delay_ms;
        self
    }

    pub fn submitted(&self) -> Vec<(Address, u64, GasSettings)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KittenLedger for FakeLedger {
    fn has_signer(&self) -> bool {
        self.signer
    }

    async fn signer_balance(&self) -> Result<U256> {
        Ok(self.balance)
    }

    async fn gas_price(&self) -> Result<U256> {
        Ok(U256::from(Self::GAS_PRICE))
    }

    async fn submit_set_kittens(
        &self,
        user: Address,
        kittens: u64,
        gas: GasSettings,
    ) -> Result<TxHash> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if self.submit_delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.submit_delay_ms)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(message) = &self.fail_submit {
            return Err(AppError::BlockchainRPC(message.clone()));
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((user, kittens, gas));
        Ok(TxHash::from_low_u64_be(submitted.len() as u64))
    }

    async fn get_kittens(&self, _user: Address) -> Result<U256> {
        if self.fail_reads {
            return Err(AppError::BlockchainRPC("connection refused".to_string()));
        }
        Ok(self.kittens)
    }
}

pub struct FakeWallet {
    pub accounts: Vec<Address>,
    pub chain_id: u64,
    pub calls: AtomicUsize,
}

impl FakeWallet {
    pub fn on_chain(chain_id: u64) -> Self {
        Self {
            accounts: vec![crate::utils::parse_address(VALID_ADDRESS).unwrap()],
            chain_id,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> std::result::Result<Vec<Address>, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> std::result::Result<u64, String> {
        Ok(self.chain_id)
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A relay stand-in that answers every `setKittens` with the same canned reply.
pub async fn spawn_canned_relay(
    status: StatusCode,
    body: serde_json::Value,
) -> (String, Arc<AtomicUsize>) {
    spawn_slow_relay(status, body, 0).await
}

/// Like `spawn_canned_relay`, but each reply is held back for `delay_ms`.
pub async fn spawn_slow_relay(
    status: StatusCode,
    body: serde_json::Value,
    delay_ms: u64,
) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        crate::constants::ROUTE_SET_KITTENS,
        post(move || {
            let counter = counter.clone();
            let body = body.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if delay_ms > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                }
                (status, Json(body))
            }
        }),
    );
    (spawn_router(router).await, hits)
}
