use crate::{
    config::Config,
    error::{AppError, Result},
    models::SetKittensRequest,
    utils::{is_valid_kitten_count, parse_address},
};
use ethers::types::{Address, U256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::onchain::{ChainLedger, GasSettings, KittenLedger};

pub const INVALID_INPUT_MESSAGE: &str =
    "Invalid input: kittens must be an integer between 0 and 60, and userAddress must be valid";

#[derive(Debug, Clone)]
pub struct RelayPolicy {
    pub gas_limit: u64,
    pub gas_price_multiplier_percent: Option<u64>,
    pub min_balance_wei: U256,
    pub balance_check: bool,
    pub confirmations: usize,
}

impl RelayPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            gas_limit: config.gas_limit,
            gas_price_multiplier_percent: config.gas_price_multiplier_percent,
            min_balance_wei: U256::from(config.min_balance_wei),
            balance_check: config.balance_check,
            confirmations: config.confirmations,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayerSubmitResult {
    pub tx_hash: String,
}

/// Privileged writer for the on-chain kitten counter.
///
/// Requests are validated before any chain access, and writes for the same
/// user address are serialized so they land in arrival order.
pub struct RelayerService {
    ledger: Arc<dyn KittenLedger>,
    policy: RelayPolicy,
    user_locks: Mutex<HashMap<Address, Arc<tokio::sync::Mutex<()>>>>,
}

impl RelayerService {
    pub fn from_config(config: &Config) -> Result<Self> {
        let ledger = ChainLedger::from_config(config)?;
        Ok(Self::new(Arc::new(ledger), RelayPolicy::from_config(config)))
    }

    pub fn new(ledger: Arc<dyn KittenLedger>, policy: RelayPolicy) -> Self {
        Self {
            ledger,
            policy,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn has_signer(&self) -> bool {
        self.ledger.has_signer()
    }

    pub fn validate(req: &SetKittensRequest) -> Result<(Address, u64)> {
        if !is_valid_kitten_count(req.kittens) {
            return Err(AppError::BadRequest(INVALID_INPUT_MESSAGE.to_string()));
        }
        let user = parse_address(&req.user_address)
            .ok_or_else(|| AppError::BadRequest(INVALID_INPUT_MESSAGE.to_string()))?;
        Ok((user, req.kittens as u64))
    }

    pub async fn set_kittens(&self, req: &SetKittensRequest) -> Result<RelayerSubmitResult> {
        let (user, kittens) = Self::validate(req)?;
        if !self.ledger.has_signer() {
            return Err(AppError::MissingCredential);
        }

        let lock = self.user_lock(user);
        let _guard = lock.lock().await;

        if self.policy.balance_check {
            let balance = self.ledger.signer_balance().await?;
            if balance < self.policy.min_balance_wei {
                tracing::warn!(
                    "Relay balance {} wei below minimum {} wei",
                    balance,
                    self.policy.min_balance_wei
                );
                return Err(AppError::InsufficientFunds);
            }
        }

        let gas_price = match self.policy.gas_price_multiplier_percent {
            Some(percent) => Some(scale_gas_price(self.ledger.gas_price().await?, percent)),
            None => None,
        };
        let gas = GasSettings {
            gas_limit: self.policy.gas_limit,
            gas_price,
            confirmations: self.policy.confirmations,
        };

        tracing::info!(
            "Relaying setKittens({:#x}, {}) gas_limit={} gas_price={:?}",
            user,
            kittens,
            gas.gas_limit,
            gas.gas_price
        );
        let tx_hash = self.ledger.submit_set_kittens(user, kittens, gas).await?;

        Ok(RelayerSubmitResult {
            tx_hash: format!("{:#x}", tx_hash),
        })
    }

    /// On-chain count for `user_address`; any failure reads as 0.
    pub async fn get_kittens(&self, user: Address) -> u64 {
        match self.ledger.get_kittens(user).await {
            Ok(value) if value <= U256::from(u64::MAX) => value.as_u64(),
            Ok(value) => {
                tracing::warn!("getKittens returned out-of-range value {}", value);
                0
            }
            Err(err) => {
                tracing::warn!("getKittens failed for {:#x}: {}", user, err);
                0
            }
        }
    }

    fn user_lock(&self, user: Address) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks.entry(user).or_default().clone()
    }
}

pub fn scale_gas_price(price: U256, percent: u64) -> U256 {
    price * U256::from(percent) / U256::from(100u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{valid_address, FakeLedger};

    fn policy() -> RelayPolicy {
        RelayPolicy {
            gas_limit: 100_000,
            gas_price_multiplier_percent: None,
            min_balance_wei: U256::from(1_000u64),
            balance_check: true,
            confirmations: 1,
        }
    }

    fn request(kittens: i64) -> SetKittensRequest {
        SetKittensRequest {
            kittens,
            user_address: valid_address().to_string(),
        }
    }

    #[test]
    fn scale_gas_price_applies_percent() {
        assert_eq!(scale_gas_price(U256::from(1_000u64), 150), U256::from(1_500u64));
        assert_eq!(scale_gas_price(U256::from(1_000u64), 100), U256::from(1_000u64));
    }

    #[test]
    fn validate_rejects_out_of_range_and_bad_address() {
        assert!(RelayerService::validate(&request(60)).is_ok());
        assert!(matches!(
            RelayerService::validate(&request(61)),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            RelayerService::validate(&request(-1)),
            Err(AppError::BadRequest(_))
        ));
        let bad = SetKittensRequest {
            kittens: 1,
            user_address: "0x1234".to_string(),
        };
        assert!(matches!(
            RelayerService::validate(&bad),
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn submits_with_policy_gas_limit() {
        let ledger = Arc::new(FakeLedger::funded());
        let relayer = RelayerService::new(ledger.clone(), policy());

        let result = relayer.set_kittens(&request(15)).await.unwrap();

        assert!(result.tx_hash.starts_with("0x"));
        let submitted = ledger.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].1, 15);
        assert_eq!(submitted[0].2.gas_limit, 100_000);
        assert_eq!(submitted[0].2.gas_price, None);
    }

    #[tokio::test]
    async fn multiplier_raises_gas_price() {
        let ledger = Arc::new(FakeLedger::funded());
        let mut policy = policy();
        policy.gas_price_multiplier_percent = Some(150);
        let relayer = RelayerService::new(ledger.clone(), policy);

        relayer.set_kittens(&request(3)).await.unwrap();

        let expected = scale_gas_price(FakeLedger::GAS_PRICE.into(), 150);
        assert_eq!(ledger.submitted()[0].2.gas_price, Some(expected));
    }

    #[tokio::test]
    async fn low_balance_fails_closed() {
        let ledger = Arc::new(FakeLedger::with_balance(U256::from(10u64)));
        let relayer = RelayerService::new(ledger.clone(), policy());

        let err = relayer.set_kittens(&request(3)).await.unwrap_err();

        assert!(matches!(err, AppError::InsufficientFunds));
        assert!(ledger.submitted().is_empty());
    }

    #[tokio::test]
    async fn balance_check_can_be_disabled() {
        let ledger = Arc::new(FakeLedger::with_balance(U256::zero()));
        let mut policy = policy();
        policy.balance_check = false;
        let relayer = RelayerService::new(ledger.clone(), policy);

        assert!(relayer.set_kittens(&request(3)).await.is_ok());
    }

    #[tokio::test]
    async fn missing_key_is_reported_after_validation() {
        let ledger = Arc::new(FakeLedger::without_signer());
        let relayer = RelayerService::new(ledger, policy());

        assert!(matches!(
            relayer.set_kittens(&request(61)).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            relayer.set_kittens(&request(5)).await,
            Err(AppError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn read_failures_degrade_to_zero() {
        let ledger = Arc::new(FakeLedger::funded().failing_reads());
        let relayer = RelayerService::new(ledger, policy());
        let user = parse_address(valid_address()).unwrap();

        assert_eq!(relayer.get_kittens(user).await, 0);
    }

    #[tokio::test]
    async fn concurrent_writes_for_one_user_are_serialized() {
        let ledger = Arc::new(FakeLedger::funded().with_submit_delay_ms(30));
        let relayer = Arc::new(RelayerService::new(ledger.clone(), policy()));

        let first = {
            let relayer = relayer.clone();
            tokio::spawn(async move { relayer.set_kittens(&request(1)).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = {
            let relayer = relayer.clone();
            tokio::spawn(async move { relayer.set_kittens(&request(2)).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(ledger.max_in_flight(), 1);
        let order: Vec<u64> = ledger.submitted().iter().map(|s| s.1).collect();
        assert_eq!(order, vec![1, 2]);
    }
}
