use lifestyle_studio::server::{serve, ServerState};
use lifestyle_studio::Settings;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "lifestyle_studio=info,tower_http=info";

#[tokio::main]
async fn main() -> lifestyle_studio::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::from_env()?;
    if settings.bria_api_token.is_none() {
        tracing::warn!("BRIA_API_TOKEN is not set; generation requests will fail");
    }
    if settings.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; scene suggestion requests will fail");
    }

    let state = ServerState::new(settings)?;
    if let Err(err) = serve(state).await {
        tracing::error!(error = %err, "server stopped");
        return Err(err);
    }
    Ok(())
}
