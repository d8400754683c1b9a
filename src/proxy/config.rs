use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::proxy::common::whitelist::Whitelist;

/// Forward proxy configuration, built once at process start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Exact paths allowed through, `*` allows everything
    #[serde(default)]
    pub whitelist: Whitelist,

    /// Basic-auth gate; `None` disables it
    #[serde(default)]
    pub auth: Option<BasicCredentials>,

    /// Audience requested for the identity token
    pub client_id: String,

    /// Where identity tokens come from
    #[serde(default)]
    pub identity: IdentitySource,

    /// Outbound request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Proxy used for outbound traffic
    #[serde(default)]
    pub upstream_proxy: UpstreamProxyConfig,
}

/// Static username/password guarding the proxy itself
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity token source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentitySource {
    /// Compute metadata server reachable at `host`
    Metadata { host: String },
    /// Service account JSON key file
    ServiceAccount { key_path: PathBuf },
}

impl Default for IdentitySource {
    fn default() -> Self {
        Self::Metadata {
            host: DEFAULT_METADATA_HOST.to_string(),
        }
    }
}

pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";

/// Upstream proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpstreamProxyConfig {
    /// Whether enabled
    pub enabled: bool,
    /// Proxy address (http://, https://, socks5://)
    pub url: String,
}

impl ProxyConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            whitelist: Whitelist::default(),
            auth: None,
            client_id: client_id.into(),
            identity: IdentitySource::default(),
            request_timeout: default_request_timeout(),
            upstream_proxy: UpstreamProxyConfig::default(),
        }
    }

    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_auth_enabled(&self) -> bool {
        self.auth.is_some()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    300
}
