use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub chain_id: u64,
    pub contract: String,
    pub signer: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // A missing key only fails setKittens; the relay itself stays up.
    let signer_status = if state.relayer.has_signer() {
        "configured".to_string()
    } else {
        "missing".to_string()
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_id: state.config.chain_id,
        contract: state.config.kitten_contract_address.clone(),
        signer: signer_status,
    })
}
