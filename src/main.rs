use anyhow::Context;
use tracing_subscriber::EnvFilter;

use clinic_gateway::{app, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up API_BASE_URL and friends
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    init_tracing(config.server.json_logs);
    tracing::info!("Starting clinic gateway in {:?} mode", config.environment);

    match config.upstream.base_url.as_deref() {
        Some(base) => tracing::info!(upstream = base, "upstream configured"),
        None => tracing::warn!("API_BASE_URL is not set; every proxied call will fail"),
    }

    let state = AppState::from_config(config).context("failed to build upstream client")?;
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("clinic gateway listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("clinic_gateway=info,tower_http=info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
