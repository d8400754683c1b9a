// Forward handler
use axum::{
    body::Body,
    extract::State,
    http::{header::InvalidHeaderValue, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::proxy::common::headers::{
    build_forward_headers, build_target_url, filter_response_headers, header_str,
    FORWARD_HOST_HEADER,
};
use crate::proxy::common::whitelist::{decode_path, normalize_path};
use crate::proxy::server::AppState;

/// Failures that abort a forwarded request
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to obtain identity token: {0}")]
    Identity(AppError),

    #[error("Identity token is not a valid header value: {0}")]
    InvalidToken(#[from] InvalidHeaderValue),

    #[error("Forwarding to {url} failed: {source}")]
    Upstream { url: String, source: AppError },
}

// Details stay in the log, the caller only gets a short reason
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error!("{}", self);
        let (status, body) = match &self {
            Self::Identity(_) | Self::InvalidToken(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to obtain identity token",
            ),
            Self::Upstream { .. } => (StatusCode::BAD_GATEWAY, "Failed to reach forwarding target"),
        };
        (status, body).into_response()
    }
}

/// Forward any request to the host named in `Forward-Host`, with an identity token attached
pub async fn handle_request(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    // 1. Target host
    let Some(host) = header_str(&headers, FORWARD_HOST_HEADER) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            format!("Required header {} not present", FORWARD_HOST_HEADER),
        )
            .into_response());
    };

    let url = build_target_url(&headers, host, uri.path());

    // 2. Whitelist, matched against the decoded path
    let decoded_path = decode_path(uri.path());
    let path = normalize_path(&decoded_path);
    if !state.config.whitelist.allows(path) {
        warn!("Rejected {} {}, not in whitelist", method, url);
        return Ok((
            StatusCode::FORBIDDEN,
            format!("Requested path {} not in whitelist", path),
        )
            .into_response());
    }

    // 3. Identity token, fetched fresh for every request
    let token = state
        .token_manager
        .get_token()
        .await
        .map_err(ProxyError::Identity)?;
    let outbound_headers = build_forward_headers(&headers, &token)?;

    // 4. Upstream call
    info!("{} {}", method, url);
    let upstream = state
        .upstream
        .forward(method, &url, outbound_headers, body)
        .await
        .map_err(|source| ProxyError::Upstream {
            url: url.clone(),
            source,
        })?;

    // 5. Relay
    let mut response = (upstream.status, Body::from(upstream.body)).into_response();
    *response.headers_mut() = filter_response_headers(&upstream.headers);
    Ok(response)
}
