//! HTTP transport.
//!
//! Posts JSON-encoded GraphQL requests to a single endpoint, authenticating
//! with an API key header.

use crate::error::Result;
use crate::transport::Transport;
use crate::types::{Request, Response};
use serde_json::Value;
use std::time::Duration;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Blocking GraphQL-over-HTTP transport.
///
/// # Example
///
/// ```no_run
/// use graphql::transport::Transport;
/// use graphql::transport::http::HttpTransport;
///
/// let transport = HttpTransport::new("http://tower.local/graphql", "secret");
/// let data = transport.query("query { info { time } }").unwrap();
/// println!("{}", data["info"]["time"]);
/// ```
pub struct HttpTransport {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// GraphQL endpoint URL.
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport with the default timeout.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a transport whose requests fail after `timeout`.
    #[must_use]
    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Get the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn execute(&self, query: &str, variables: Option<&Value>) -> Result<Value> {
        log::trace!("POST {}\n{query}", self.endpoint);

        let response: Response = self
            .agent
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header("Accept", "application/json")
            .send_json(&Request { query, variables })?
            .body_mut()
            .read_json()?;

        response.into_data()
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn query(&self, query: &str) -> Result<Value> {
        self.execute(query, None)
    }

    fn mutate(&self, mutation: &str, variables: &Value) -> Result<Value> {
        self.execute(mutation, Some(variables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let transport = HttpTransport::new("http://tower.local/graphql", "key");
        assert_eq!(transport.endpoint(), "http://tower.local/graphql");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let transport = HttpTransport::new("http://tower.local/graphql", "super-secret");
        let debug = format!("{transport:?}");
        assert!(debug.contains("tower.local"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_unreachable_endpoint_is_retryable() {
        // Port 9 (discard) on localhost is almost never listening
        let transport =
            HttpTransport::with_timeout("http://127.0.0.1:9/graphql", "key", Duration::from_secs(2));
        let err = transport.query("query { info { time } }").unwrap_err();
        assert!(err.is_retryable());
    }
}
