//! Publish interface to the telemetry ingestion endpoint.
//!
//! The wire protocol, retry policy, and security handshake belong to the
//! remote side; this module only hands a JSON payload to an authenticated
//! HTTP endpoint. Production code uses `HttpPublisher`; tests substitute
//! recording fakes behind the same trait.

use async_trait::async_trait;
use skateway_common::{PublishError, Reading};
use tracing::debug;

use crate::config::ConnectionString;

/// Per-site publish interface.
///
/// `disconnect` is idempotent and is invoked exactly once per channel during
/// loop teardown.
#[async_trait]
pub trait SitePublisher: Send + Sync {
    async fn publish(&self, reading: &Reading) -> Result<(), PublishError>;

    async fn disconnect(&self);
}

/// Live publisher: POSTs the JSON reading to the site's ingestion endpoint
/// with the shared key as a bearer token.
pub struct HttpPublisher {
    site: String,
    endpoint: String,
    key: String,
    client: reqwest::Client,
}

impl HttpPublisher {
    /// Acquire a connection handle for one site. The client is constructed
    /// once at startup and reused for every cycle.
    pub fn connect(site: &str, credential: &ConnectionString) -> Self {
        debug!("Connecting publisher for site '{}'", site);
        Self {
            site: site.to_string(),
            endpoint: credential.endpoint.clone(),
            key: credential.key.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SitePublisher for HttpPublisher {
    async fn publish(&self, reading: &Reading) -> Result<(), PublishError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.key)
            .json(reading)
            .send()
            .await
            .map_err(|e| PublishError::new(&self.site, e.to_string()))?;

        response
            .error_for_status()
            .map_err(|e| PublishError::new(&self.site, e.to_string()))?;

        Ok(())
    }

    async fn disconnect(&self) {
        // HTTP connections are pooled by the client; nothing to tear down
        // beyond dropping it. Safe to call more than once.
        debug!("Disconnected publisher for site '{}'", self.site);
    }
}

/// Inert publisher used to shape dry-run channels, where no credential
/// exists and nothing is ever sent.
pub struct NullPublisher;

#[async_trait]
impl SitePublisher for NullPublisher {
    async fn publish(&self, reading: &Reading) -> Result<(), PublishError> {
        Err(PublishError::new(
            reading.location.clone(),
            "no live connection in dry-run mode",
        ))
    }

    async fn disconnect(&self) {}
}
