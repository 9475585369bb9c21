//! # graphql
//!
//! Minimal blocking GraphQL client.
//!
//! This crate provides:
//! - A [`Transport`] trait returning the `data` object of a response
//! - An HTTP implementation authenticating with an API key header
//! - A [`MockTransport`] with canned replies and call recording
//! - Categorized errors for retry decisions
//!
//! ## Example
//!
//! ```no_run
//! use graphql::{HttpTransport, Transport};
//! use serde_json::json;
//!
//! let transport = HttpTransport::new("http://tower.local/graphql", "secret");
//!
//! let data = transport.query("query { server { status } }").unwrap();
//! println!("Server: {}", data["server"]["status"]);
//!
//! transport
//!     .mutate(
//!         "mutation ($id: PrefixedID!) { docker { start(id: $id) { id } } }",
//!         &json!({"id": "abc"}),
//!     )
//!     .unwrap();
//! ```
//!
//! ## Partial Results
//!
//! GraphQL servers may answer with both `data` and `errors`. Whenever `data`
//! is present it is returned and the errors are logged; only a response
//! without data is an error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod transport;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use transport::http::HttpTransport;
pub use transport::{MockTransport, MutationCall, Reply, Transport};
pub use types::{Request, Response, ResponseError};
