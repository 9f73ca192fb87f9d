use std::sync::Arc;

use safewalk::{
    config::ServiceConfig, create_router, engine::SafetyEngine, google::GoogleMapsClient,
    weights::SubregionWeights, AppState,
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safewalk=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;

    let weights = SubregionWeights::from_file(&config.weights_path)?;
    tracing::info!(
        "loaded {} subregion weights from {}",
        weights.len(),
        config.weights_path.display()
    );

    let google = Arc::new(GoogleMapsClient::with_endpoints(
        config.api_key.clone(),
        config.provider_timeout,
        config.directions_url.clone(),
        config.roads_url.clone(),
    )?);
    let engine = SafetyEngine::new(
        Arc::new(weights),
        google.clone(),
        google,
        config.selection(),
    );

    let state = AppState {
        engine: Arc::new(engine),
    };
    let app = create_router(state).layer(CorsLayer::permissive());

    tracing::info!("starting safewalk on http://{}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
