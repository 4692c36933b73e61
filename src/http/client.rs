//! HTTP client implementation

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use super::request::FuzzRequest;
use super::response::Response;
use crate::app::HttpConfig;
use crate::error::HttpError;

/// Executes fuzz requests
///
/// Implementations are shared by every worker of a run and must tolerate
/// concurrent calls.
#[async_trait::async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &FuzzRequest) -> Result<Response, HttpError>;
}

/// HTTP client wrapper
pub struct HttpClient {
    /// Inner reqwest client; pooled connections and a synchronized cookie jar
    client: reqwest::Client,

    /// Default timeout
    timeout: Duration,

    /// Maximum response body size to capture (bytes)
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            })
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout,
            max_response_size: config.max_response_size,
        })
    }

    fn classify(&self, e: reqwest::Error) -> HttpError {
        if e.is_timeout() {
            HttpError::Timeout(self.timeout.as_millis() as u64)
        } else if e.is_connect() {
            HttpError::ConnectionError(e.to_string())
        } else if e.is_body() || e.is_decode() {
            HttpError::BodyError(e.to_string())
        } else {
            HttpError::RequestFailed(e.to_string())
        }
    }

    /// Build response from reqwest response
    async fn build_response(
        &self,
        mut response: reqwest::Response,
        start: Instant,
    ) -> Result<Response, HttpError> {
        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("")
            .to_string();
        let http_version = format!("{:?}", response.version());

        let mut headers = BTreeMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.as_str().to_string(), v.to_string());
            }
        }

        // Only the first `max_response_size` bytes are kept; the rest is
        // read and counted, never buffered
        let mut body = Vec::new();
        let mut size = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            size += chunk.len();
            let room = self.max_response_size.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }

        Ok(Response {
            status,
            status_text,
            headers,
            body,
            size,
            duration_ms: start.elapsed().as_millis() as u64,
            http_version,
        })
    }
}

#[async_trait::async_trait]
impl RequestExecutor for HttpClient {
    async fn execute(&self, request: &FuzzRequest) -> Result<Response, HttpError> {
        let start = Instant::now();

        let method = reqwest::Method::from_str(&request.method)
            .map_err(|e| HttpError::RequestFailed(e.to_string()))?;

        let mut headers = HeaderMap::new();
        for (key, value) in &request.headers {
            let name = HeaderName::from_str(key)
                .map_err(|e| HttpError::RequestFailed(format!("header '{}': {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::RequestFailed(format!("header '{}': {}", key, e)))?;
            headers.append(name, value);
        }
        if let Some(cookies) = request.cookie_header() {
            let value = HeaderValue::from_str(&cookies)
                .map_err(|e| HttpError::RequestFailed(format!("cookie header: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let response = self
            .client
            .request(method, request.url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        self.build_response(response, start).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new(&HttpConfig::default());
        assert!(client.is_ok());
    }
}
