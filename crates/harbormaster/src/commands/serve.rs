use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use quay_gateway::{
    start_server, AppState, AuthConfig, ErrorHandler, MemoryAgent, StaticTopology,
};
use quay_hooks::HooksManager;

use crate::config::Config;

pub async fn execute(host: Option<String>, port: Option<u16>, config: &Config) -> Result<()> {
    let host = host.unwrap_or_else(|| config.gateway.bind_host.clone());
    let port = port.unwrap_or(config.gateway.bind_port);

    // node id must not be blank, so generate one when it wasn't configured
    let node_id = if config.gateway.node_id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        config.gateway.node_id.clone()
    };

    info!(host = %host, port, node_id = %node_id, "Starting gateway");

    let api_token = if config.auth.api_token.is_empty() {
        None
    } else {
        Some(config.auth.api_token.clone())
    };

    let topology = StaticTopology::single(
        node_id,
        config.gateway.server_group.clone(),
        config.gateway.advertise_host.clone(),
        config.gateway.advertise_port,
    );

    let state = AppState {
        agent: Arc::new(MemoryAgent::new()),
        hooks: Arc::new(HooksManager::new()),
        topology: Arc::new(topology),
        auth_config: Arc::new(AuthConfig::new(api_token)),
        error_handler: Arc::new(ErrorHandler::new(config.gateway.debug)),
        allowed_origins: config.gateway.allowed_origins.clone(),
    };

    start_server(state, &host, port).await?;

    Ok(())
}
