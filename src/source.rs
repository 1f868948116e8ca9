use async_trait::async_trait;
use tracing::debug;

/// Public host for shared spreadsheets.
pub const DEFAULT_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";

/// Identifies one spreadsheet on a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
    pub id: String,
    pub base_url: String,
}

impl SheetHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_base_url(id, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Structured-table query endpoint (JSON wrapped in a callback envelope).
    pub fn table_query_url(&self) -> String {
        format!("{}/{}/gviz/tq?tqx=out:json", self.base_url, self.id)
    }

    /// Flat delimited export endpoint.
    pub fn flat_export_url(&self) -> String {
        format!("{}/{}/export?format=csv", self.base_url, self.id)
    }
}

/// Raw upstream reply. Non-success statuses are returned, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Read-only access to the spreadsheet host.
#[async_trait]
pub trait SheetTransport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport.
pub struct HttpSheetTransport {
    http: reqwest::Client,
}

impl HttpSheetTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for HttpSheetTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SheetTransport for HttpSheetTransport {
    async fn fetch(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        debug!(url, status, "upstream responded");
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_for_default_host() {
        let h = SheetHandle::new("abc123");
        assert_eq!(
            h.table_query_url(),
            "https://docs.google.com/spreadsheets/d/abc123/gviz/tq?tqx=out:json"
        );
        assert_eq!(
            h.flat_export_url(),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let h = SheetHandle::with_base_url("x", "http://127.0.0.1:9000/sheets/");
        assert_eq!(h.flat_export_url(), "http://127.0.0.1:9000/sheets/x/export?format=csv");
    }

    #[test]
    fn success_range() {
        let ok = TransportResponse { status: 200, body: String::new() };
        let redirect = TransportResponse { status: 302, body: String::new() };
        let missing = TransportResponse { status: 404, body: String::new() };
        assert!(ok.is_success());
        assert!(!redirect.is_success());
        assert!(!missing.is_success());
    }
}
