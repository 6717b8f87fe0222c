use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kitten_relay::{
    api::{self, build_router},
    config::Config,
    services::RelayerService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kitten_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting kitten relay");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Contract: {}", config.kitten_contract_address);
    if !config.has_signer() {
        tracing::warn!("GAME_PRIVATE_KEY not set; setKittens will answer 500 until it is");
    }

    let relayer = RelayerService::from_config(&config)?;
    let app_state = api::AppState {
        config: config.clone(),
        relayer: Arc::new(relayer),
    };
    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
