use serde::{Deserialize, Serialize};

/// Transaction hash returned by the relay, `0x`-prefixed hex.
pub type TxId = String;

/// Body of `POST /api/setKittens`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetKittensRequest {
    pub kittens: i64,
    #[serde(rename = "userAddress")]
    pub user_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetKittensResponse {
    #[serde(rename = "txHash")]
    pub tx_hash: TxId,
}

/// What the relay client reads back. Exactly one field is expected.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RelayResponse {
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetKittensQuery {
    #[serde(rename = "userAddress")]
    pub user_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetKittensResponse {
    pub kittens: u64,
}
