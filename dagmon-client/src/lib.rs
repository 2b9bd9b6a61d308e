//! Dagmon HTTP Client
//!
//! A small, type-safe client for the status service that owns a remote DAG job,
//! and the [`JobHandle`] abstraction the monitor polls.
//!
//! # Example
//!
//! ```no_run
//! use dagmon_client::{DagClient, HttpJobHandle, JobHandle};
//! use dagmon_core::dto::job::StatusOptions;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dagmon_client::ClientError> {
//!     let client = DagClient::new("http://localhost:8080");
//!     let handle = HttpJobHandle::new(client, "dag_1700000000000_0001_1");
//!
//!     let status = handle
//!         .fetch_status(&StatusOptions::with_counters(), Duration::from_millis(200))
//!         .await?;
//!
//!     println!("DAG state: {}", status.state);
//!     Ok(())
//! }
//! ```

mod dags;
pub mod error;
mod handle;

// Re-export commonly used types
pub use dags::KILL_REQUEST_TIMEOUT;
pub use error::{ClientError, ErrorKind, Result};
pub use handle::{HttpJobHandle, JobHandle};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the DAG status service
///
/// Status and kill endpoints are implemented in the `dags` module.
#[derive(Debug, Clone)]
pub struct DagClient {
    /// Base URL of the service (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl DagClient {
    /// Create a new DAG client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the status service (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use dagmon_client::DagClient;
    ///
    /// let client = DagClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new DAG client with a custom HTTP client
    ///
    /// This allows you to configure proxies, TLS settings, etc. Per-request
    /// timeouts are always set from the poll budget.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DagClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = DagClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = DagClient::with_client("http://localhost:8080", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
