pub mod error;
pub mod modules;
pub mod proxy; // Proxy service module
pub mod utils;

use crate::error::AppResult;
use crate::proxy::config::ProxyConfig;
use crate::proxy::upstream::client::UpstreamClient;
use crate::proxy::{AppState, TokenManager};

/// Assemble the shared request-handling state from configuration
pub fn build_state(config: ProxyConfig) -> AppResult<AppState> {
    let identity_client = utils::http::create_identity_client(config.request_timeout);
    let upstream_client =
        utils::http::create_client_with_proxy(config.request_timeout, Some(&config.upstream_proxy));

    let token_manager =
        TokenManager::new(identity_client, &config.identity, config.client_id.clone())?;
    let upstream = UpstreamClient::new(upstream_client);

    tracing::info!(
        "Whitelist: {:?}, basic auth: {}, audience: {}",
        config.whitelist.entries(),
        if config.is_auth_enabled() { "enabled" } else { "disabled" },
        token_manager.audience()
    );

    Ok(AppState::new(config, token_manager, upstream))
}
