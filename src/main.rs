use pairec_mcp_server::{config::Config, logging, run_stdio, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let _log_guard = logging::init_logging(&config.logging)?;

    let state = AppState::from_config(&config);

    info!(
        handshake = %config.handshake,
        tools = state.tools.descriptors().len(),
        "server starting"
    );

    run_stdio(state).await?;
    Ok(())
}
