use std::sync::Arc;

use tokio::io::BufReader;
use tracing::Instrument;

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod stdio;

use config::{Config, HandshakePolicy};
use domain::tools::ToolRegistry;
use mcp::server::Session;
use stdio::transport::{serve, TransportError};

/// Process-wide, read-only server state shared by every session.
#[derive(Clone)]
pub struct AppState {
    pub handshake: HandshakePolicy,
    pub tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(handshake: HandshakePolicy, tools: ToolRegistry) -> Self {
        Self {
            handshake,
            tools: Arc::new(tools),
        }
    }

    pub fn with_policy(handshake: HandshakePolicy) -> Self {
        Self::new(handshake, ToolRegistry::builtin())
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_policy(config.handshake)
    }
}

/// Serve a single client on this process's stdin/stdout until stdin closes.
pub async fn run_stdio(state: AppState) -> Result<(), TransportError> {
    let mut session = Session::new(state);
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    serve(&mut session, reader, writer)
        .instrument(tracing::info_span!("stdio_session"))
        .await
}
