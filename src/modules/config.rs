use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::proxy::common::whitelist::Whitelist;
use crate::proxy::config::{
    BasicCredentials, IdentitySource, ProxyConfig, UpstreamProxyConfig, DEFAULT_METADATA_HOST,
};

/// Load proxy configuration from the process environment
pub fn load_proxy_config() -> AppResult<ProxyConfig> {
    load_proxy_config_from(|key| std::env::var(key).ok())
}

/// Load proxy configuration through an arbitrary variable lookup
pub fn load_proxy_config_from<F>(lookup: F) -> AppResult<ProxyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let client_id = non_empty("CLIENT_ID")
        .ok_or_else(|| AppError::Config("CLIENT_ID is not set".to_string()))?;

    let mut config = ProxyConfig::new(client_id);

    config.whitelist = lookup("WHITELIST")
        .map(|raw| Whitelist::parse(&raw))
        .unwrap_or_default();

    // Both must be present for the gate to be active
    config.auth = match (lookup("AUTH_USERNAME"), lookup("AUTH_PASSWORD")) {
        (Some(username), Some(password)) => Some(BasicCredentials { username, password }),
        _ => None,
    };

    config.identity = match non_empty("GOOGLE_APPLICATION_CREDENTIALS") {
        Some(path) => IdentitySource::ServiceAccount {
            key_path: path.into(),
        },
        None => IdentitySource::Metadata {
            host: non_empty("GCE_METADATA_HOST")
                .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_string()),
        },
    };

    if let Some(host) = non_empty("HOST") {
        config.host = host;
    }
    if let Some(port) = parse_var(&non_empty, "PORT")? {
        config.port = port;
    }
    if let Some(timeout) = parse_var(&non_empty, "REQUEST_TIMEOUT_SECS")? {
        config.request_timeout = timeout;
    }
    if let Some(url) = non_empty("UPSTREAM_PROXY_URL") {
        config.upstream_proxy = UpstreamProxyConfig { enabled: true, url };
    }

    Ok(config)
}

fn parse_var<T, F>(lookup: &F, key: &str) -> AppResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", key, raw, e)))
        })
        .transpose()
}
