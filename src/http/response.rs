//! HTTP response types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Captured HTTP response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Response headers
    pub headers: BTreeMap<String, String>,

    /// Response body, truncated to the configured capture limit
    pub body: Vec<u8>,

    /// Full body size in bytes, before truncation
    pub size: usize,

    /// Response time in milliseconds
    pub duration_ms: u64,

    /// HTTP version
    pub http_version: String,
}

impl Response {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response is server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get body as string
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get a specific header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 0,
            status_text: String::new(),
            headers: BTreeMap::new(),
            body: Vec::new(),
            size: 0,
            duration_ms: 0,
            http_version: "HTTP/1.1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes_and_header_lookup() {
        let mut response = Response {
            status: 503,
            ..Default::default()
        };
        response
            .headers
            .insert("content-type".into(), "text/html".into());

        assert!(response.is_server_error());
        assert!(!response.is_success());
        assert_eq!(response.header("Content-Type"), Some("text/html"));
    }
}
