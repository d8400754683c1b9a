// Basic authentication middleware
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::proxy::config::BasicCredentials;
use crate::proxy::server::AppState;

pub const UNAUTHORIZED_BODY: &str =
    "Could not verify your access level for that URL.\nYou have to login with proper credentials.";
pub const LOGIN_CHALLENGE: &str = "Basic realm=\"Login Required\"";

/// Basic authentication gate, a no-op unless credentials are configured
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.auth.as_ref() else {
        return next.run(request).await;
    };

    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_basic_auth);

    match supplied {
        Some((user, pass)) if credentials_valid(&user, &pass, expected) => {
            next.run(request).await
        }
        _ => {
            tracing::debug!(
                "Basic auth rejected for {} {}",
                request.method(),
                request.uri()
            );
            unauthorized()
        }
    }
}

/// Decode a `Basic <base64(user:pass)>` header value
pub fn parse_basic_auth(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub fn credentials_valid(username: &str, password: &str, expected: &BasicCredentials) -> bool {
    username == expected.username && password == expected.password
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, LOGIN_CHALLENGE)],
        Body::from(UNAUTHORIZED_BODY),
    )
        .into_response()
}
