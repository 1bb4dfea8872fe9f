use anyhow::Context;
use recipe_ai::{AiConfig, DesignOrchestrator};
use recipe_mesh::BuildConfig;
use recipe_server::ServerConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let server = ServerConfig::from_env()?;
    let ai = AiConfig::from_env()?;
    let orchestrator = DesignOrchestrator::from_config(&ai, BuildConfig::default());
    let online = orchestrator.is_online();

    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .with_context(|| format!("failed to bind {}", server.addr))?;
    info!(addr = %server.addr, online, model = %ai.model, "Listening");

    axum::serve(listener, recipe_server::app(orchestrator)).await?;
    Ok(())
}
