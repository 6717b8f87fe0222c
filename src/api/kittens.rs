use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};

use crate::{
    error::{AppError, Result},
    models::{GetKittensQuery, GetKittensResponse, SetKittensRequest, SetKittensResponse},
    services::relayer::INVALID_INPUT_MESSAGE,
    utils::parse_address,
};

use super::AppState;

/// POST /api/setKittens
///
/// Body parsing happens here rather than through the default extractor so that
/// every malformed body (wrong types, missing fields, bad JSON) is a 400 with
/// the relay's JSON error shape.
pub async fn set_kittens(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SetKittensRequest>, JsonRejection>,
) -> Result<Json<SetKittensResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!("setKittens rejected body: {}", rejection.body_text());
        AppError::BadRequest(INVALID_INPUT_MESSAGE.to_string())
    })?;

    let result = state.relayer.set_kittens(&req).await?;
    tracing::info!(
        "setKittens confirmed for {}: {} kittens, tx {}",
        req.user_address,
        req.kittens,
        result.tx_hash
    );

    Ok(Json(SetKittensResponse {
        tx_hash: result.tx_hash,
    }))
}

/// GET /api/getKittens?userAddress=0x...
pub async fn get_kittens(
    State(state): State<AppState>,
    query: std::result::Result<Query<GetKittensQuery>, QueryRejection>,
) -> Result<Json<GetKittensResponse>> {
    let Query(query) = query
        .map_err(|_| AppError::BadRequest("userAddress query parameter is required".to_string()))?;
    let user = parse_address(&query.user_address)
        .ok_or_else(|| AppError::BadRequest("userAddress must be valid".to_string()))?;

    let kittens = state.relayer.get_kittens(user).await;
    Ok(Json(GetKittensResponse { kittens }))
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
