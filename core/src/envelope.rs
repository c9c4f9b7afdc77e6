//! The uniform `{ ok, status, body }` result of every gateway call.
//!
//! # Design
//! The gateway reports failure as data: a 404 from the server and a dropped
//! connection both come back as an `Envelope` with `ok == false`.
//! `into_result` is the one place where that is turned into a
//! `Result<_, ServiceError>` for the services above.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{GatewayError, ServiceError};
use crate::http::HttpResponse;

/// Message placed in the synthesized body when no response was received.
pub const UNRESPONSIVE_MESSAGE: &str = "The server is unresponsive";

/// Message placed in the synthesized body when the request body could not
/// be converted for the wire.
pub const INVALID_PAYLOAD_MESSAGE: &str = "The request payload is invalid";

/// Normalized result of a gateway call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// `true` iff `status` is in `200..300`.
    pub ok: bool,
    pub status: u16,
    pub body: Value,
}

impl Envelope {
    /// Wrap a received HTTP response. `ok` is derived from the status only.
    ///
    /// An empty body becomes `null`; a body that is not JSON is kept as a
    /// JSON string so nothing the server sent is lost.
    pub fn from_response(response: HttpResponse) -> Self {
        let body = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body).unwrap_or(Value::String(response.body))
        };
        Self {
            ok: (200..300).contains(&response.status),
            status: response.status,
            body,
        }
    }

    /// Synthesize the 500 envelope for a call that produced no response.
    pub fn failure(error: &GatewayError) -> Self {
        let message = match error {
            GatewayError::Transport(_) => UNRESPONSIVE_MESSAGE,
            GatewayError::Payload(_) => INVALID_PAYLOAD_MESSAGE,
        };
        Self {
            ok: false,
            status: 500,
            body: json!({
                "code": 500,
                "message": message,
                "description": error.to_string(),
            }),
        }
    }

    /// The server's `message` field, when it sent a string one.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Turn a non-ok envelope into `ServiceError::Rejected`, using the
    /// server's message or `fallback`. An ok envelope yields its body.
    pub fn into_result(self, fallback: &str) -> Result<Value, ServiceError> {
        if self.ok {
            return Ok(self.body);
        }
        let message = self.message().unwrap_or(fallback).to_string();
        Err(ServiceError::Rejected {
            status: self.status,
            message,
        })
    }
}
