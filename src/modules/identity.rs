use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, AppResult};

// Google identity endpoints
const METADATA_IDENTITY_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/identity";
const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR: &str = "Google";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Service account JSON key, as downloaded from the IAM console
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Claims of the self-signed assertion exchanged for an ID token
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenAssertion {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub target_audience: String,
}

#[derive(Debug, Deserialize)]
struct IdTokenResponse {
    id_token: String,
}

/// Load and check a service account key file
pub fn load_service_account_key(path: &Path) -> AppResult<ServiceAccountKey> {
    let content = std::fs::read_to_string(path)?;
    let key: ServiceAccountKey = serde_json::from_str(&content)?;

    if key.key_type != "service_account" {
        return Err(AppError::Config(format!(
            "Credentials file {:?} has type '{}', only service_account keys can mint ID tokens",
            path, key.key_type
        )));
    }

    Ok(key)
}

/// Ask the metadata server for an ID token scoped to `audience`
pub async fn fetch_metadata_id_token(
    client: &Client,
    metadata_host: &str,
    audience: &str,
) -> AppResult<String> {
    let url = metadata_identity_url(metadata_host, audience)?;

    let response = client
        .get(url)
        .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Identity(format!(
            "Metadata server returned {}: {}",
            status, body
        )));
    }

    let token = response.text().await?.trim().to_string();
    if token.is_empty() {
        return Err(AppError::Identity(
            "Metadata server returned an empty token".to_string(),
        ));
    }
    Ok(token)
}

fn metadata_identity_url(metadata_host: &str, audience: &str) -> AppResult<url::Url> {
    let base = format!("http://{}{}", metadata_host, METADATA_IDENTITY_PATH);
    url::Url::parse_with_params(&base, &[("audience", audience), ("format", "full")])
        .map_err(|e| AppError::Config(format!("Invalid metadata host {}: {}", metadata_host, e)))
}

/// Sign the JWT-bearer assertion for `audience`
pub fn sign_assertion(
    key: &ServiceAccountKey,
    encoding_key: &EncodingKey,
    audience: &str,
    now: i64,
) -> AppResult<String> {
    let claims = IdTokenAssertion {
        iss: key.client_email.clone(),
        sub: key.client_email.clone(),
        aud: key.token_uri.clone(),
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
        target_audience: audience.to_string(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    Ok(jsonwebtoken::encode(&header, &claims, encoding_key)?)
}

/// Exchange a signed assertion at the key's token endpoint
pub async fn fetch_service_account_id_token(
    client: &Client,
    key: &ServiceAccountKey,
    encoding_key: &EncodingKey,
    audience: &str,
) -> AppResult<String> {
    let assertion = sign_assertion(key, encoding_key, audience, chrono::Utc::now().timestamp())?;

    let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];

    let response = client.post(&key.token_uri).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Identity(format!(
            "Token endpoint returned {}: {}",
            status, body
        )));
    }

    let token = response.json::<IdTokenResponse>().await?;
    if token.id_token.is_empty() {
        return Err(AppError::Identity(
            "Token endpoint returned an empty id_token".to_string(),
        ));
    }
    Ok(token.id_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation};
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test_rsa_key.pem");
    const TEST_PUB_KEY: &str = include_str!("../../tests/fixtures/test_rsa_key.pub.pem");

    fn test_key(token_uri: &str) -> ServiceAccountKey {
        ServiceAccountKey {
            key_type: "service_account".to_string(),
            client_email: "proxy@project.iam.gserviceaccount.com".to_string(),
            private_key: TEST_KEY.to_string(),
            private_key_id: Some("key-1".to_string()),
            token_uri: token_uri.to_string(),
        }
    }

    #[test]
    fn test_metadata_url() {
        let url = metadata_identity_url("metadata.google.internal", "https://svc.example").unwrap();
        assert_eq!(
            url.as_str(),
            "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/identity?audience=https%3A%2F%2Fsvc.example&format=full"
        );
    }

    #[test]
    fn test_sign_assertion_claims() {
        let key = test_key("https://oauth2.googleapis.com/token");
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).unwrap();
        let now = chrono::Utc::now().timestamp();

        let jwt = sign_assertion(&key, &encoding_key, "my-client-id", now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://oauth2.googleapis.com/token"]);
        let decoded = jsonwebtoken::decode::<IdTokenAssertion>(
            &jwt,
            &DecodingKey::from_rsa_pem(TEST_PUB_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(decoded.header.kid.as_deref(), Some("key-1"));
        assert_eq!(decoded.claims.iss, "proxy@project.iam.gserviceaccount.com");
        assert_eq!(decoded.claims.sub, decoded.claims.iss);
        assert_eq!(decoded.claims.target_audience, "my-client-id");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
    }

    #[test]
    fn test_load_rejects_non_service_account() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"type": "authorized_user", "client_email": "", "private_key": ""}"#,
        )
        .unwrap();

        let err = load_service_account_key(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_load_defaults_token_uri() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::json!({
            "type": "service_account",
            "client_email": "proxy@project.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        });
        std::io::Write::write_all(&mut file, json.to_string().as_bytes()).unwrap();

        let key = load_service_account_key(file.path()).unwrap();
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
        assert!(key.private_key_id.is_none());
    }

    #[tokio::test]
    async fn test_fetch_metadata_id_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(METADATA_IDENTITY_PATH))
            .and(header("Metadata-Flavor", "Google"))
            .and(query_param("audience", "my-client-id"))
            .and(query_param("format", "full"))
            .respond_with(ResponseTemplate::new(200).set_body_string("eyJ.meta.token\n"))
            .expect(1)
            .mount(&server)
            .await;

        let host = server.address().to_string();
        let token = fetch_metadata_id_token(&Client::new(), &host, "my-client-id")
            .await
            .unwrap();
        assert_eq!(token, "eyJ.meta.token");
    }

    #[tokio::test]
    async fn test_fetch_metadata_id_token_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(METADATA_IDENTITY_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_string("no service account"))
            .mount(&server)
            .await;

        let host = server.address().to_string();
        let err = fetch_metadata_id_token(&Client::new(), &host, "aud")
            .await
            .unwrap_err();
        match err {
            AppError::Identity(msg) => assert!(msg.contains("404")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_service_account_id_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
            ))
            .and(body_string_contains("assertion="))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id_token": "eyJ.sa.token" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let key = test_key(&format!("{}/token", server.uri()));
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).unwrap();
        let token = fetch_service_account_id_token(&Client::new(), &key, &encoding_key, "aud")
            .await
            .unwrap();
        assert_eq!(token, "eyJ.sa.token");
    }
}
