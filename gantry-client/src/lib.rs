//! Gantry Scheduler Client
//!
//! A type-safe HTTP client for the job scheduler control-plane API.
//!
//! The scheduler executor drives every remote job through this client, so
//! the endpoint set maps one-to-one onto the job lifecycle: create, start,
//! status, stop, delete and batch delete.
//!
//! # Example
//!
//! ```no_run
//! use gantry_client::SchedulerClient;
//! use gantry_core::dto::job::JobSpec;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SchedulerClient::new("http://scheduler.default.svc:9091");
//!
//!     let reply = client.create_job(&JobSpec {
//!         name: "u1234".to_string(),
//!         namespace: "pipeline-1".to_string(),
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("created job: {}", reply.name);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the job scheduler API
///
/// One instance per configured scheduler address. The scheduler reports
/// request-level failures inside its JSON envelopes with HTTP 200, so this
/// client only turns transport and non-2xx failures into errors; envelope
/// `error` fields are left for the caller to interpret (some of them mean
/// "already exists" and are not failures at all).
#[derive(Debug, Clone)]
pub struct SchedulerClient {
    /// Base URL of the scheduler (e.g. "http://scheduler.default.svc:9091")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl SchedulerClient {
    /// Create a new scheduler client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the scheduler API
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new scheduler client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the scheduler
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle an API response and deserialize JSON
    ///
    /// Checks the status code and returns an appropriate error if the
    /// request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
