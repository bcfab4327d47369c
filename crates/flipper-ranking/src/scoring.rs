//! Scoring service client
//!
//! Talks to the external scoring API: a status endpoint that reports the
//! state of a wallet's scoring job, and the data url it hands out once the
//! job is ready.

use std::time::Duration;

use async_trait::async_trait;
use flipper_core::{CollectionRequest, CollectionStatus, RankedItem};
use reqwest::header::ACCEPT;
use reqwest::Client;

use crate::config::ScoringConfig;
use crate::error::{RankingError, Result};

/// The scoring service as seen by the poller
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Ask for the status of the job identified by `request`.
    ///
    /// Not-found and server-error answers come back as a status carrying the
    /// code; only transport and decoding failures are errors.
    async fn check_status(&self, request: &CollectionRequest) -> Result<CollectionStatus>;

    /// Retrieve the ranked payload of a ready job. Called once per job.
    async fn fetch_payload(&self, data_url: &str) -> Result<Vec<RankedItem>>;
}

/// HTTP client for the scoring API
pub struct ScoringClient {
    client: Client,
    api_url: String,
}

impl ScoringClient {
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("flipper-ranking/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RankingError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl ScoringService for ScoringClient {
    async fn check_status(&self, request: &CollectionRequest) -> Result<CollectionStatus> {
        tracing::debug!(
            wallet = %request.wallet_address,
            contract = %request.contract_address,
            force = request.force,
            "Requesting collection status"
        );

        let response = self
            .client
            .post(&self.api_url)
            .json(request)
            .send()
            .await
            .map_err(|e| RankingError::TransientFetch(e.to_string()))?;

        let http_status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RankingError::TransientFetch(e.to_string()))?;

        // The service reports job state in the body even on 404/500.
        let mut status: CollectionStatus = match serde_json::from_str(&body) {
            Ok(status) => status,
            Err(e) if http_status.is_success() => return Err(e.into()),
            Err(_) => CollectionStatus::pending(),
        };
        if status.status_code.is_none() || !http_status.is_success() {
            status.status_code = Some(http_status.as_u16());
        }

        tracing::debug!(
            status = ?status.status,
            status_code = ?status.status_code,
            "Collection status received"
        );

        Ok(status)
    }

    async fn fetch_payload(&self, data_url: &str) -> Result<Vec<RankedItem>> {
        let response = self
            .client
            .get(data_url)
            .header(ACCEPT, "*/*")
            .send()
            .await
            .map_err(|e| RankingError::FetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RankingError::FetchFailed(format!(
                "Payload endpoint returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RankingError::FetchFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single HTTP request with `status_line` and `body`; returns the base url.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // read the whole request so the client never sees a reset
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn client_for(base_url: &str) -> ScoringClient {
        ScoringClient::new(&ScoringConfig {
            api_url: format!("{}/collection", base_url),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn request() -> CollectionRequest {
        flipper_core::SessionState::new("0xw", "sig", "0xc").collection_request()
    }

    #[tokio::test]
    async fn test_not_found_page_is_no_data() {
        let base = serve_once("404 Not Found", "<html>nope</html>").await;

        let status = client_for(&base).check_status(&request()).await.unwrap();
        assert_eq!(status.status_code, Some(404));
        assert!(status.is_no_data());
        assert!(!status.is_ready());
    }

    #[tokio::test]
    async fn test_server_error_body_keeps_http_code() {
        let base = serve_once(
            "500 Internal Server Error",
            r#"{"status":"pending","statusCode":200}"#,
        )
        .await;

        let status = client_for(&base).check_status(&request()).await.unwrap();
        assert_eq!(status.status_code, Some(500));
        assert!(status.is_no_data());
    }

    #[tokio::test]
    async fn test_ready_status() {
        let base = serve_once(
            "200 OK",
            r#"{"status":"ready","dataUrl":"https://cdn.example/job.json"}"#,
        )
        .await;

        let status = client_for(&base).check_status(&request()).await.unwrap();
        assert!(status.is_ready());
        assert!(!status.is_no_data());
        assert_eq!(status.status_code, Some(200));
        assert_eq!(status.data_url.as_deref(), Some("https://cdn.example/job.json"));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_an_error() {
        let base = serve_once("200 OK", "{\"status\": ").await;

        let err = client_for(&base).check_status(&request()).await.unwrap_err();
        assert!(matches!(err, RankingError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_fetch_payload() {
        let base = serve_once(
            "200 OK",
            r#"[{"token_id":"1","name":"A","image_url":"u","score":10.5,"rank":1,"traits":[]}]"#,
        )
        .await;

        let items = client_for(&base)
            .fetch_payload(&format!("{}/payload.json", base))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].token_id, "1");
    }

    #[tokio::test]
    async fn test_fetch_payload_error_status() {
        let base = serve_once("503 Service Unavailable", "busy").await;

        let err = client_for(&base)
            .fetch_payload(&format!("{}/payload.json", base))
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::FetchFailed(msg) if msg.contains("503")));
    }

    #[test]
    fn test_client_uses_configured_url() {
        let config = ScoringConfig {
            api_url: "http://localhost:9999/collection".to_string(),
            timeout_seconds: 5,
        };
        let client = ScoringClient::new(&config).unwrap();
        assert_eq!(client.api_url(), "http://localhost:9999/collection");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transient() {
        let config = ScoringConfig {
            // reserved port, nothing listens here
            api_url: "http://127.0.0.1:9/collection".to_string(),
            timeout_seconds: 2,
        };
        let client = ScoringClient::new(&config).unwrap();
        let request = flipper_core::SessionState::new("0xw", "sig", "0xc").collection_request();

        let err = client.check_status(&request).await.unwrap_err();
        assert!(matches!(err, RankingError::TransientFetch(_)));

        let err = client
            .fetch_payload("http://127.0.0.1:9/payload.json")
            .await
            .unwrap_err();
        assert!(matches!(err, RankingError::FetchFailed(_)));
    }
}
