use phone_ai::{build_router, config::AppConfig, telemetry};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal outside development.
    let _ = dotenv::dotenv();

    let config = AppConfig::load()?;
    telemetry::init_tracing(&config.logging)?;

    if config.anthropic.api_key.is_none() {
        warn!("ANTHROPIC_API_KEY is not set; every reply will be an error message");
    }
    match &config.security.allowed_sender {
        Some(sender) => info!(%sender, "replying to a single allowed sender"),
        None => info!("no allowlist configured; replying to every sender"),
    }

    let app = build_router(&config)?;
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
