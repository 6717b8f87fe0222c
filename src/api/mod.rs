// src/api/mod.rs

pub mod health;
pub mod kittens;

use axum::http::{header, HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::constants::{ROUTE_GET_KITTENS, ROUTE_HEALTH, ROUTE_SET_KITTENS};
use crate::services::relayer::RelayerService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub relayer: Arc<RelayerService>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        .route(ROUTE_HEALTH, get(health::health_check))
        .route(
            ROUTE_SET_KITTENS,
            post(kittens::set_kittens).fallback(kittens::method_not_allowed),
        )
        .route(
            ROUTE_GET_KITTENS,
            get(kittens::get_kittens).fallback(kittens::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Browser game origins. The relay only takes JSON GETs and POSTs, so the
/// preflight advertises exactly those.
fn cors_from_config(config: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparsable CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS has no usable origin; allowing any origin");
        return base.allow_origin(Any);
    }
    tracing::info!("CORS restricted to {} origin(s)", origins.len());
    base.allow_origin(AllowOrigin::list(origins))
}
