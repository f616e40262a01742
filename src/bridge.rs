//! Memory-bridge client
//!
//! Talks to the companion memory service over HTTP:
//! - GET /health → {"ok": true}
//! - GET /memory/retrieve?sessionId=...&limit=... → stored memories
//!
//! Requests carry X-API-Key when a bridge API key is configured.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::BridgeSettings;

// ============================================================================
// Data types
// ============================================================================

/// Server response for GET /health
#[derive(Debug, Deserialize)]
struct HealthResponse {
    ok: bool,
}

/// One stored memory entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub id: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// Server response for GET /memory/retrieve
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    pub session_id: String,
    pub memories: Vec<MemoryEntry>,
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for the memory bridge.
pub struct BridgeClient {
    settings: BridgeSettings,
    client: Client,
}

impl BridgeClient {
    pub fn new(settings: BridgeSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { settings, client })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.settings.base_url, path);
        let mut req = self.client.get(url);
        if let Some(ref key) = self.settings.api_key {
            req = req.header("X-API-Key", key);
        }
        req
    }

    /// Check that the bridge is up and answering.
    pub async fn health(&self) -> Result<()> {
        let response = self
            .get("/health")
            .send()
            .await
            .with_context(|| format!("Bridge unreachable at {}", self.settings.base_url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Bridge health check returned HTTP {}", status);
        }

        let health: HealthResponse = response
            .json()
            .await
            .context("Bridge health response was not valid JSON")?;

        if !health.ok {
            bail!("Bridge reported not-ok health");
        }

        info!(url = %self.settings.base_url, "Bridge healthy");
        Ok(())
    }

    /// Retrieve stored memories for a session.
    pub async fn retrieve(&self, session_id: &str, limit: Option<u32>) -> Result<RetrieveResponse> {
        if session_id.trim().is_empty() {
            return Err(anyhow!("sessionId must not be empty"));
        }

        let mut req = self
            .get("/memory/retrieve")
            .query(&[("sessionId", session_id)]);
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit.to_string())]);
        }

        let response = req
            .send()
            .await
            .with_context(|| format!("Bridge unreachable at {}", self.settings.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Bridge retrieve returned HTTP {}: {}", status, body);
        }

        let parsed: RetrieveResponse = response
            .json()
            .await
            .context("Bridge retrieve response was not valid JSON")?;

        debug!(
            session_id = %parsed.session_id,
            count = parsed.memories.len(),
            "Memories retrieved"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = BridgeClient::new(BridgeSettings::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_retrieve_rejects_empty_session() {
        let client = BridgeClient::new(BridgeSettings::default()).unwrap();
        let result = tokio_test::block_on(client.retrieve("  ", None));
        assert!(result.is_err());
    }

    #[test]
    fn test_retrieve_response_parsing() {
        let data = r#"{
            "sessionId": "s-1",
            "memories": [
                {"id": "m-1", "sessionId": "s-1", "role": "user",
                 "content": "hello", "createdAt": "2025-01-01T00:00:00Z"}
            ]
        }"#;
        let parsed: RetrieveResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.session_id, "s-1");
        assert_eq!(parsed.memories.len(), 1);
        assert_eq!(parsed.memories[0].role, "user");
    }

    #[test]
    fn test_health_response_parsing() {
        let parsed: HealthResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(parsed.ok);
    }
}
