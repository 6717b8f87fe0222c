use crate::{
    config::Config,
    error::{AppError, Result},
};
use async_trait::async_trait;
use ethers::{
    contract::abigen,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, TransactionReceipt, TxHash, U256, U64},
};
use std::{str::FromStr, sync::Arc};

abigen!(
    KittenContract,
    r#"[
        function getKittens() view returns (uint256)
        function setKittens(address userAddress, uint256 _value)
        function fundContract() payable
        function owner() view returns (address)
        event KittensUpdated(address user, uint256 newValue)
        event UserRewarded(address user, uint256 amount)
        event DonationReceived(address donor, uint256 amount)
    ]"#
);

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Gas parameters for one relayed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limit: u64,
    pub gas_price: Option<U256>,
    pub confirmations: usize,
}

/// Chain access needed by the relay. `ChainLedger` is the ethers-backed
/// implementation; tests substitute their own.
#[async_trait]
pub trait KittenLedger: Send + Sync {
    fn has_signer(&self) -> bool;
    async fn signer_balance(&self) -> Result<U256>;
    async fn gas_price(&self) -> Result<U256>;
    /// Submits `setKittens(user, kittens)` and waits for the requested confirmations.
    async fn submit_set_kittens(
        &self,
        user: Address,
        kittens: u64,
        gas: GasSettings,
    ) -> Result<TxHash>;
    async fn get_kittens(&self, user: Address) -> Result<U256>;
}

pub struct OnchainReader {
    contract: KittenContract<Provider<Http>>,
}

pub struct OnchainInvoker {
    client: Arc<SignerClient>,
    contract: KittenContract<SignerClient>,
}

impl OnchainReader {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = Arc::new(connect_provider(&config.chain_rpc_url)?);
        let contract_address = parse_contract_address(&config.kitten_contract_address)?;
        let contract = KittenContract::new(contract_address, provider);
        Ok(Self { contract })
    }

    /// `getKittens()` reads `msg.sender`, so the call is issued with `from = user`.
    pub async fn get_kittens(&self, user: Address) -> Result<U256> {
        self.contract
            .get_kittens()
            .from(user)
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }
}

impl OnchainInvoker {
    /// `Ok(None)` when no signing key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(private_key) = config.game_private_key.as_deref() else {
            return Ok(None);
        };
        Self::from_private_key(config, private_key).map(Some)
    }

    pub fn from_private_key(config: &Config, private_key: &str) -> Result<Self> {
        let provider = connect_provider(&config.chain_rpc_url)?;
        let wallet = LocalWallet::from_str(private_key.trim())
            .map_err(|e| AppError::Internal(format!("Invalid signing key: {}", e)))?
            .with_chain_id(config.chain_id);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract_address = parse_contract_address(&config.kitten_contract_address)?;
        let contract = KittenContract::new(contract_address, client.clone());
        Ok(Self { client, contract })
    }

    pub fn signer_address(&self) -> Address {
        self.client.address()
    }

    pub async fn balance(&self) -> Result<U256> {
        self.client
            .get_balance(self.client.address(), None)
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    pub async fn gas_price(&self) -> Result<U256> {
        self.client
            .get_gas_price()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    pub async fn chain_id(&self) -> Result<u64> {
        self.client
            .get_chainid()
            .await
            .map(|id| id.as_u64())
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    pub async fn owner(&self) -> Result<Address> {
        self.contract
            .owner()
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    pub async fn set_kittens(
        &self,
        user: Address,
        kittens: u64,
        gas: GasSettings,
    ) -> Result<TxHash> {
        let mut call = self
            .contract
            .set_kittens(user, U256::from(kittens))
            .gas(gas.gas_limit);
        if let Some(price) = gas.gas_price {
            call = call.gas_price(price);
        }

        let pending = call
            .send()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        let tx_hash = pending.tx_hash();
        tracing::info!("setKittens submitted: {:#x}", tx_hash);

        let receipt = pending
            .confirmations(gas.confirmations)
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        ensure_success(tx_hash, receipt)?;
        Ok(tx_hash)
    }

    pub async fn fund_contract(&self, amount_wei: U256, confirmations: usize) -> Result<TxHash> {
        let call = self.contract.fund_contract().value(amount_wei);
        let pending = call
            .send()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        let tx_hash = pending.tx_hash();
        tracing::info!("fundContract submitted: {:#x}", tx_hash);

        let receipt = pending
            .confirmations(confirmations)
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        ensure_success(tx_hash, receipt)?;
        Ok(tx_hash)
    }
}

/// ethers-backed ledger used by the relay binary.
pub struct ChainLedger {
    reader: OnchainReader,
    invoker: Option<OnchainInvoker>,
}

impl ChainLedger {
    pub fn from_config(config: &Config) -> Result<Self> {
        let reader = OnchainReader::from_config(config)?;
        let invoker = OnchainInvoker::from_config(config)?;
        if let Some(invoker) = &invoker {
            tracing::info!("Relay signer: {:#x}", invoker.signer_address());
        }
        Ok(Self { reader, invoker })
    }

    fn invoker(&self) -> Result<&OnchainInvoker> {
        self.invoker.as_ref().ok_or(AppError::MissingCredential)
    }
}

#[async_trait]
impl KittenLedger for ChainLedger {
    fn has_signer(&self) -> bool {
        self.invoker.is_some()
    }

    async fn signer_balance(&self) -> Result<U256> {
        self.invoker()?.balance().await
    }

    async fn gas_price(&self) -> Result<U256> {
        self.invoker()?.gas_price().await
    }

    async fn submit_set_kittens(
        &self,
        user: Address,
        kittens: u64,
        gas: GasSettings,
    ) -> Result<TxHash> {
        self.invoker()?.set_kittens(user, kittens, gas).await
    }

    async fn get_kittens(&self, user: Address) -> Result<U256> {
        self.reader.get_kittens(user).await
    }
}

fn connect_provider(rpc_url: &str) -> Result<Provider<Http>> {
    Provider::<Http>::try_from(rpc_url)
        .map_err(|e| AppError::Internal(format!("Invalid RPC URL: {}", e)))
}

fn parse_contract_address(value: &str) -> Result<Address> {
    crate::utils::parse_address(value)
        .ok_or_else(|| AppError::Internal(format!("Invalid contract address: {}", value)))
}

fn ensure_success(tx_hash: TxHash, receipt: Option<TransactionReceipt>) -> Result<()> {
    let Some(receipt) = receipt else {
        return Err(AppError::BlockchainRPC(format!(
            "Transaction {:#x} dropped before confirmation",
            tx_hash
        )));
    };
    if receipt.status == Some(U64::from(0)) {
        return Err(AppError::Reverted(format!("{:#x}", tx_hash)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn receipt_with_status(status: u64) -> TransactionReceipt {
        TransactionReceipt {
            status: Some(U64::from(status)),
            ..Default::default()
        }
    }

    #[test]
    fn invoker_absent_without_key() {
        let mut config = test_config();
        config.game_private_key = None;
        assert!(OnchainInvoker::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn invoker_derives_signer_address_from_key() {
        let invoker = OnchainInvoker::from_config(&test_config())
            .unwrap()
            .expect("key configured");
        assert_eq!(
            crate::utils::checksum(&invoker.signer_address()),
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
        );
    }

    #[test]
    fn invalid_key_is_internal_error() {
        let mut config = test_config();
        config.game_private_key = Some("0xnothex".to_string());
        assert!(matches!(
            OnchainInvoker::from_config(&config),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn reverted_and_dropped_receipts_fail() {
        let hash = TxHash::zero();
        assert!(ensure_success(hash, Some(receipt_with_status(1))).is_ok());
        assert!(matches!(
            ensure_success(hash, Some(receipt_with_status(0))),
            Err(AppError::Reverted(_))
        ));
        assert!(matches!(
            ensure_success(hash, None),
            Err(AppError::BlockchainRPC(_))
        ));
    }

    #[tokio::test]
    async fn ledger_without_signer_reports_missing_credential() {
        let mut config = test_config();
        config.game_private_key = None;
        let ledger = ChainLedger::from_config(&config).unwrap();
        assert!(!ledger.has_signer());
        assert!(matches!(
            ledger.signer_balance().await,
            Err(AppError::MissingCredential)
        ));
    }
}
