use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::Address,
};
use std::sync::Arc;

use crate::error::ConnectError;

/// The signing capability a host exposes (an injected browser wallet, or a
/// JSON-RPC node for native hosts).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the wallet for account access.
    async fn request_accounts(&self) -> Result<Vec<Address>, String>;
    async fn chain_id(&self) -> Result<u64, String>;
}

/// `WalletProvider` over a JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct RpcWallet {
    provider: Provider<Http>,
}

impl RpcWallet {
    pub fn new(rpc_url: &str) -> Result<Self, ConnectError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ConnectError::Provider(format!("Invalid wallet RPC URL: {}", e)))?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, String> {
        self.provider
            .request::<_, Vec<Address>>("eth_requestAccounts", ())
            .await
            .map_err(|e| e.to_string())
    }

    async fn chain_id(&self) -> Result<u64, String> {
        self.provider
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(|e| e.to_string())
    }
}

/// Browser-wallet session. Holds no account state: every `connect` re-derives
/// the address and network from the provider.
#[derive(Clone)]
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    expected_chain_id: u64,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, expected_chain_id: u64) -> Self {
        Self {
            provider,
            expected_chain_id,
        }
    }

    pub fn disconnected(expected_chain_id: u64) -> Self {
        Self::new(None, expected_chain_id)
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn connect(&self) -> Result<Address, ConnectError> {
        let Some(provider) = &self.provider else {
            return Err(ConnectError::NoProvider);
        };

        let accounts = provider
            .request_accounts()
            .await
            .map_err(ConnectError::Provider)?;
        let chain_id = provider.chain_id().await.map_err(ConnectError::Provider)?;
        if chain_id != self.expected_chain_id {
            tracing::warn!(
                "Wallet on chain {} (expected {})",
                chain_id,
                self.expected_chain_id
            );
            return Err(ConnectError::WrongNetwork {
                expected: self.expected_chain_id,
                actual: chain_id,
            });
        }

        accounts.first().copied().ok_or(ConnectError::NoAccounts)
    }
}
