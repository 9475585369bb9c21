//! Transport trait and implementations.
//!
//! [`Transport`] is the seam between the mirror and the server. The primary
//! implementation is [`http::HttpTransport`]; [`MockTransport`] answers from
//! a queue of canned replies and records every call.
//!
//! # Testing
//!
//! ```
//! use graphql::transport::{MockTransport, Transport};
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.push_data(json!({"info": {"time": "2024-01-01T00:00:00Z"}}));
//!
//! let data = mock.query("query { info { time } }").unwrap();
//! assert_eq!(data["info"]["time"], "2024-01-01T00:00:00Z");
//! assert_eq!(mock.queries().len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Executes GraphQL documents against a server.
pub trait Transport: Send + Sync {
    /// Run a query and return its `data` object.
    fn query(&self, query: &str) -> Result<Value>;

    /// Run a mutation with variables and return its `data` object.
    fn mutate(&self, mutation: &str, variables: &Value) -> Result<Value>;
}

/// A canned reply of [`MockTransport`].
#[derive(Debug, Clone)]
pub enum Reply {
    /// Succeed with this `data` object.
    Data(Value),
    /// Fail with an HTTP error carrying this message.
    Fail(String),
}

/// A recorded mutation call.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationCall {
    /// Mutation document.
    pub mutation: String,
    /// Variables it was sent with.
    pub variables: Value,
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<Reply>,
    fallback: Option<Reply>,
    queries: Vec<String>,
    mutations: Vec<MutationCall>,
}

/// Mock transport for testing without network access.
///
/// Replies are consumed in order; once the queue is empty the fallback reply
/// (if any) is repeated. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock with no replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers every call with `data`.
    #[must_use]
    pub fn always(data: Value) -> Self {
        let mock = Self::new();
        mock.set_fallback(Reply::Data(data));
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a successful reply.
    pub fn push_data(&self, data: Value) {
        self.lock().replies.push_back(Reply::Data(data));
    }

    /// Queue a failing reply.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock().replies.push_back(Reply::Fail(message.into()));
    }

    /// Reply used once the queue runs dry.
    pub fn set_fallback(&self, reply: Reply) {
        self.lock().fallback = Some(reply);
    }

    /// Queries received so far, oldest first.
    pub fn queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    /// Mutations received so far, oldest first.
    pub fn mutations(&self) -> Vec<MutationCall> {
        self.lock().mutations.clone()
    }

    fn next_reply(state: &mut MockState) -> Result<Value> {
        let reply = state
            .replies
            .pop_front()
            .or_else(|| state.fallback.clone())
            .ok_or_else(|| Error::Other("mock transport has no reply configured".into()))?;
        match reply {
            Reply::Data(data) => Ok(data),
            Reply::Fail(message) => Err(Error::http(message, None)),
        }
    }
}

impl Transport for MockTransport {
    fn query(&self, query: &str) -> Result<Value> {
        let mut state = self.lock();
        state.queries.push(query.to_string());
        Self::next_reply(&mut state)
    }

    fn mutate(&self, mutation: &str, variables: &Value) -> Result<Value> {
        let mut state = self.lock();
        state.mutations.push(MutationCall {
            mutation: mutation.to_string(),
            variables: variables.clone(),
        });
        Self::next_reply(&mut state)
    }
}
