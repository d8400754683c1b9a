use reqwest::{Client, Proxy};

use crate::proxy::config::UpstreamProxyConfig;

/// Create the outbound HTTP client for forwarded requests, with an optional upstream proxy
pub fn create_client_with_proxy(
    timeout_secs: u64,
    proxy_config: Option<&UpstreamProxyConfig>,
) -> Client {
    let mut builder = Client::builder().timeout(std::time::Duration::from_secs(timeout_secs));

    if let Some(config) = proxy_config {
        if config.enabled && !config.url.is_empty() {
            match Proxy::all(&config.url) {
                Ok(proxy) => {
                    builder = builder.proxy(proxy);
                    tracing::info!("HTTP client upstream proxy enabled: {}", config.url);
                }
                Err(e) => {
                    tracing::error!("Invalid proxy address: {}, error: {}", config.url, e);
                }
            }
        }
    }

    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default HTTP client: {}", e);
        Client::new()
    })
}

/// Create the client for identity provider calls.
///
/// Never proxied: the metadata server is link-local and `HTTP_PROXY` style
/// environment settings must not reroute it either.
pub fn create_identity_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .no_proxy()
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default identity HTTP client: {}", e);
            Client::new()
        })
}
