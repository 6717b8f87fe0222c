use serde::Deserialize;
use std::env;

use crate::constants::{
    DEFAULT_CHAIN_RPC_URL, DEFAULT_CONFIRMATIONS, DEFAULT_GAS_LIMIT,
    DEFAULT_KITTEN_CONTRACT_ADDRESS, DEFAULT_MIN_BALANCE_WEI, DEFAULT_RELAY_TIMEOUT_MS,
    DEFAULT_RELAY_URL, EXPECTED_CHAIN_ID,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Blockchain
    pub chain_rpc_url: String,
    pub chain_id: u64,
    pub kitten_contract_address: String,

    // Relay signing. Absence is reported per request, not at startup.
    pub game_private_key: Option<String>,

    // Relay gas policy
    pub gas_limit: u64,
    pub gas_price_multiplier_percent: Option<u64>,
    pub min_balance_wei: u128,
    pub balance_check: bool,
    pub confirmations: usize,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            chain_rpc_url: env::var("CHAIN_RPC_URL")
                .unwrap_or_else(|_| DEFAULT_CHAIN_RPC_URL.to_string()),
            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| EXPECTED_CHAIN_ID.to_string())
                .parse()?,
            kitten_contract_address: env::var("KITTEN_CONTRACT_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_KITTEN_CONTRACT_ADDRESS.to_string()),

            game_private_key: env::var("GAME_PRIVATE_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),

            gas_limit: env::var("RELAY_GAS_LIMIT")
                .unwrap_or_else(|_| DEFAULT_GAS_LIMIT.to_string())
                .parse()?,
            gas_price_multiplier_percent: parse_multiplier(
                env::var("RELAY_GAS_PRICE_MULTIPLIER_PERCENT").ok().as_deref(),
            )?,
            min_balance_wei: env::var("RELAY_MIN_BALANCE_WEI")
                .unwrap_or_else(|_| DEFAULT_MIN_BALANCE_WEI.to_string())
                .parse()?,
            balance_check: env_flag("RELAY_BALANCE_CHECK", true),
            confirmations: env::var("RELAY_CONFIRMATIONS")
                .unwrap_or_else(|_| DEFAULT_CONFIRMATIONS.to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chain_rpc_url.trim().is_empty() {
            anyhow::bail!("CHAIN_RPC_URL is empty");
        }
        url::Url::parse(&self.chain_rpc_url)
            .map_err(|e| anyhow::anyhow!("CHAIN_RPC_URL is not a valid URL: {}", e))?;
        if !crate::utils::is_valid_address(&self.kitten_contract_address) {
            anyhow::bail!("KITTEN_CONTRACT_ADDRESS is not a valid address");
        }
        if self.gas_limit == 0 {
            anyhow::bail!("RELAY_GAS_LIMIT must be > 0");
        }

        if self.game_private_key.is_none() {
            tracing::warn!("GAME_PRIVATE_KEY is not set; setKittens requests will fail with 500");
        }
        if self.chain_id != EXPECTED_CHAIN_ID {
            tracing::warn!(
                "CHAIN_ID {} differs from the game's network {}",
                self.chain_id,
                EXPECTED_CHAIN_ID
            );
        }
        if !self.balance_check {
            tracing::warn!("Relay balance check disabled; transactions may fail on-chain");
        }
        if self.confirmations == 0 {
            tracing::warn!("RELAY_CONFIRMATIONS is 0; responses will not wait for inclusion");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn has_signer(&self) -> bool {
        self.game_private_key.is_some()
    }
}

/// Client-side settings for talking to the relay.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub relay_url: String,
    pub timeout_ms: u64,
    pub expected_chain_id: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            timeout_ms: DEFAULT_RELAY_TIMEOUT_MS,
            expected_chain_id: EXPECTED_CHAIN_ID,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(ClientConfig {
            relay_url: env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            timeout_ms: env::var("RELAY_TIMEOUT_MS")
                .unwrap_or_else(|_| DEFAULT_RELAY_TIMEOUT_MS.to_string())
                .parse()?,
            expected_chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| EXPECTED_CHAIN_ID.to_string())
                .parse()?,
        })
    }
}

/// Unset or blank means no multiplier; anything else must be a positive percent.
fn parse_multiplier(raw: Option<&str>) -> anyhow::Result<Option<u64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let percent: u64 = raw.parse().map_err(|e| {
        anyhow::anyhow!("RELAY_GAS_PRICE_MULTIPLIER_PERCENT is not a number: {}", e)
    })?;
    if percent == 0 {
        anyhow::bail!("RELAY_GAS_PRICE_MULTIPLIER_PERCENT must be > 0");
    }
    Ok(Some(percent))
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        chain_rpc_url: "http://127.0.0.1:8545".to_string(),
        chain_id: EXPECTED_CHAIN_ID,
        kitten_contract_address: DEFAULT_KITTEN_CONTRACT_ADDRESS.to_string(),
        game_private_key: Some(
            "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d".to_string(),
        ),
        gas_limit: DEFAULT_GAS_LIMIT,
        gas_price_multiplier_percent: None,
        min_balance_wei: DEFAULT_MIN_BALANCE_WEI,
        balance_check: true,
        confirmations: DEFAULT_CONFIRMATIONS,
        cors_allowed_origins: "*".to_string(),
    }
}
