// Header filtering for the forwarding path

use axum::http::header::{self, HeaderMap, HeaderValue};

/// HTTP/1.1 hop-by-hop headers (RFC 7230 §6.1), lowercase
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Inbound header naming the forwarding target
pub const FORWARD_HOST_HEADER: &str = "Forward-Host";

/// Inbound header carrying the target scheme
pub const FORWARDED_PROTO_HEADER: &str = "X-Forwarded-Proto";

pub const DEFAULT_SCHEME: &str = "https";

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| name.eq_ignore_ascii_case(h))
}

/// Copy of `headers` without hop-by-hop entries
pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name.as_str()) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Headers relayed back to the caller: hop-by-hop and `Content-Encoding` removed.
/// The outbound client has already decoded the body.
pub fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = strip_hop_by_hop(headers);
    out.remove(header::CONTENT_ENCODING);
    out
}

/// Inbound headers for the outbound request: `Host` dropped, bearer set
pub fn build_forward_headers(
    inbound: &HeaderMap,
    bearer_token: &str,
) -> Result<HeaderMap, header::InvalidHeaderValue> {
    let mut out = inbound.clone();
    out.remove(header::HOST);
    out.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", bearer_token))?,
    );
    Ok(out)
}

/// Non-empty visible string value of `name`
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// `scheme://host` + path
pub fn build_target_url(headers: &HeaderMap, host: &str, path: &str) -> String {
    let scheme = header_str(headers, FORWARDED_PROTO_HEADER).unwrap_or(DEFAULT_SCHEME);
    format!("{}://{}{}", scheme, host, path)
}
