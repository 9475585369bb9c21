//! Wire types for GraphQL over HTTP.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request body posted to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request<'a> {
    /// Query or mutation document.
    pub query: &'a str,
    /// Variables, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<&'a Value>,
}

/// One entry of the response's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseError {
    /// Human-readable message.
    pub message: String,
    /// Path of the field that failed, if reported.
    #[serde(default)]
    pub path: Vec<Value>,
}

/// Response body returned by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Response {
    /// Result data; `null` when the whole operation failed.
    #[serde(default)]
    pub data: Value,
    /// Errors, possibly alongside partial data.
    #[serde(default)]
    pub errors: Vec<ResponseError>,
}

impl Response {
    /// Unwrap the `data` object.
    ///
    /// Partial data wins over errors: when `data` is present the errors are
    /// logged and the data returned. Errors without data fail with
    /// [`Error::GraphQl`]; a response with neither fails with
    /// [`Error::MissingData`].
    pub fn into_data(self) -> Result<Value> {
        if !self.data.is_null() {
            for error in &self.errors {
                log::warn!("GraphQL reported a partial error: {}", error.message);
            }
            return Ok(self.data);
        }
        if self.errors.is_empty() {
            return Err(Error::MissingData);
        }
        Err(Error::GraphQl {
            messages: self.errors.into_iter().map(|e| e.message).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> Response {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_request_omits_missing_variables() {
        let body = serde_json::to_value(Request {
            query: "query { info { time } }",
            variables: None,
        })
        .unwrap();
        assert_eq!(body, json!({"query": "query { info { time } }"}));

        let vars = json!({"id": "abc"});
        let body = serde_json::to_value(Request {
            query: "mutation",
            variables: Some(&vars),
        })
        .unwrap();
        assert_eq!(body["variables"]["id"], "abc");
    }

    #[test]
    fn test_data_is_returned() {
        let data = parse(json!({"data": {"info": {"time": "now"}}})).into_data().unwrap();
        assert_eq!(data["info"]["time"], "now");
    }

    #[test]
    fn test_partial_data_wins_over_errors() {
        let response = parse(json!({
            "data": {"server": {"name": "tower"}, "docker": null},
            "errors": [{"message": "docker not running", "path": ["docker"]}]
        }));
        assert_eq!(response.errors[0].path, vec![json!("docker")]);
        let data = response.into_data().unwrap();
        assert_eq!(data["server"]["name"], "tower");
    }

    #[test]
    fn test_errors_without_data_fail() {
        let err = parse(json!({"data": null, "errors": [{"message": "Forbidden"}]}))
            .into_data()
            .unwrap_err();
        assert!(matches!(err, Error::GraphQl { messages } if messages == vec!["Forbidden"]));
    }

    #[test]
    fn test_empty_response_fails() {
        assert!(matches!(parse(json!({})).into_data(), Err(Error::MissingData)));
    }
}
