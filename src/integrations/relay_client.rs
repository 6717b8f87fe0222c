use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::{
    config::ClientConfig,
    constants::{ROUTE_GET_KITTENS, ROUTE_SET_KITTENS},
    error::SyncError,
    models::{GetKittensResponse, RelayResponse, SetKittensRequest, TxId},
    utils::{is_valid_address, is_valid_kitten_count},
};

/// HTTP client for the kitten relay. One request per call, never retried.
#[derive(Clone, Debug)]
pub struct RelayClient {
    base_url: String,
    client: Client,
}

impl RelayClient {
    pub fn new(config: &ClientConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SyncError::TransportFailure(e.to_string()))?;
        Ok(Self {
            base_url: config.relay_url.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Asks the relay to set the on-chain count for `address`.
    ///
    /// Inputs are checked before any I/O. Returns the relay's tx hash.
    pub async fn set_kittens(&self, count: i64, address: &str) -> Result<TxId, SyncError> {
        validate_sync_input(count, address)?;

        let body = SetKittensRequest {
            kittens: count,
            user_address: address.to_string(),
        };
        let resp = self
            .client
            .post(self.endpoint(ROUTE_SET_KITTENS))
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::TransportFailure(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| SyncError::TransportFailure(e.to_string()))?;
        interpret_response(status, &text)
    }

    pub async fn get_kittens(&self, address: &str) -> Result<u64, SyncError> {
        if !is_valid_address(address) {
            return Err(SyncError::InvalidInput(format!(
                "invalid address: {}",
                address
            )));
        }

        let resp = self
            .client
            .get(format!(
                "{}?userAddress={}",
                self.endpoint(ROUTE_GET_KITTENS),
                address
            ))
            .send()
            .await
            .map_err(|e| SyncError::TransportFailure(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(SyncError::TransportFailure(format!(
                "relay answered {}",
                resp.status()
            )));
        }

        let payload: GetKittensResponse = resp
            .json()
            .await
            .map_err(|e| SyncError::TransportFailure(e.to_string()))?;
        Ok(payload.kittens)
    }
}

pub fn validate_sync_input(count: i64, address: &str) -> Result<(), SyncError> {
    if !is_valid_kitten_count(count) {
        return Err(SyncError::InvalidInput(format!(
            "kitten count {} outside 0..=60",
            count
        )));
    }
    if !is_valid_address(address) {
        return Err(SyncError::InvalidInput(format!(
            "invalid address: {}",
            address
        )));
    }
    Ok(())
}

fn interpret_response(status: StatusCode, body: &str) -> Result<TxId, SyncError> {
    let parsed = serde_json::from_str::<RelayResponse>(body).ok();

    if let Some(message) = parsed.as_ref().and_then(|r| r.error.clone()) {
        return Err(SyncError::RelayRejected(message));
    }
    if !status.is_success() {
        return Err(SyncError::TransportFailure(format!(
            "relay answered {} without an error body",
            status
        )));
    }
    match parsed.and_then(|r| r.tx_hash) {
        Some(tx_hash) => Ok(tx_hash),
        None => Err(SyncError::TransportFailure(
            "relay response missing txHash".to_string(),
        )),
    }
}
