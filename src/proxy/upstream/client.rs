// Upstream client implementation
// Sends the rewritten request to the forwarding target

use bytes::Bytes;
use reqwest::{header::HeaderMap, Client, Method, StatusCode};

use crate::error::AppResult;

/// What came back from the forwarding target
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct UpstreamClient {
    http_client: Client,
}

impl UpstreamClient {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Send one request and buffer the whole response body
    pub async fn forward(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> AppResult<UpstreamResponse> {
        let response = self
            .http_client
            .request(method, url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE};
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_forward_relays_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/items/7"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"a":1}"#))
            .respond_with(
                ResponseTemplate::new(418)
                    .insert_header("x-upstream", "yes")
                    .set_body_string("teapot"),
            )
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = UpstreamClient::new(Client::new());
        let resp = client
            .forward(
                Method::PUT,
                &format!("{}/items/7", server.uri()),
                headers,
                Bytes::from_static(br#"{"a":1}"#),
            )
            .await
            .unwrap();

        assert_eq!(resp.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(resp.headers["x-upstream"], "yes");
        assert_eq!(&resp.body[..], b"teapot");
    }

    #[tokio::test]
    async fn test_forward_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = UpstreamClient::new(Client::new());
        let result = client
            .forward(
                Method::GET,
                &format!("http://{}/", addr),
                HeaderMap::new(),
                Bytes::new(),
            )
            .await;
        assert!(result.is_err());
    }
}
