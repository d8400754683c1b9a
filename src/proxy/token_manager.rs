use jsonwebtoken::EncodingKey;
use reqwest::Client;

use crate::error::AppResult;
use crate::modules::identity::{self, ServiceAccountKey};
use crate::proxy::config::IdentitySource;

enum TokenSource {
    Metadata {
        host: String,
    },
    ServiceAccount {
        key: ServiceAccountKey,
        encoding_key: EncodingKey,
    },
}

/// Mints identity tokens for the configured audience.
///
/// Every call goes to the identity provider; nothing is cached between requests.
pub struct TokenManager {
    client: Client,
    source: TokenSource,
    audience: String,
}

impl TokenManager {
    /// Create new TokenManager, loading and parsing any service account key up front
    pub fn new(client: Client, source: &IdentitySource, audience: impl Into<String>) -> AppResult<Self> {
        let source = match source {
            IdentitySource::Metadata { host } => TokenSource::Metadata { host: host.clone() },
            IdentitySource::ServiceAccount { key_path } => {
                let key = identity::load_service_account_key(key_path)?;
                let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
                tracing::info!("Identity tokens will be signed as {}", key.client_email);
                TokenSource::ServiceAccount { key, encoding_key }
            }
        };

        Ok(Self {
            client,
            source,
            audience: audience.into(),
        })
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Fetch a fresh identity token
    pub async fn get_token(&self) -> AppResult<String> {
        let token = match &self.source {
            TokenSource::Metadata { host } => {
                identity::fetch_metadata_id_token(&self.client, host, &self.audience).await?
            }
            TokenSource::ServiceAccount { key, encoding_key } => {
                identity::fetch_service_account_id_token(
                    &self.client,
                    key,
                    encoding_key,
                    &self.audience,
                )
                .await?
            }
        };

        tracing::debug!("Fetched identity token for audience {}", self.audience);
        Ok(token)
    }
}
