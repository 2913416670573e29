use std::sync::Arc;

use anyhow::{bail, Context};
use axum::http::HeaderValue;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_cell::AuthService;
use mrms_api::create_router;
use shared_config::AppConfig;
use shared_database::AppState;

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match config.cors_allowed_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(_)) => {
            warn!("CORS_ALLOWED_ORIGIN is not a valid header value, allowing any origin");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MRMS API server");

    let config = AppConfig::from_env();
    if !config.is_configured() {
        bail!("JWT_SECRET must be set before the server can start");
    }

    let cors = cors_layer(&config);
    let bind_address = config.bind_address();

    let state = AppState::initialize(config)
        .await
        .context("failed to prepare the database")?;

    AuthService::new(&state).bootstrap_admin().await?;

    let app = create_router(Arc::new(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    info!("Listening on {}", bind_address);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("cannot bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
