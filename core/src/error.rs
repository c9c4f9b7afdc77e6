//! Error types for the tracker API client.
//!
//! # Design
//! Two result kinds live side by side. The gateway never returns these to
//! its callers for network conditions; it folds them into an `Envelope`.
//! `ServiceError` is what the auth and user services hand back, produced
//! from a non-ok envelope by `Envelope::into_result`.

use thiserror::Error;

/// Contract violations from the key case converter. These are caller bugs.
#[derive(Debug, Error)]
pub enum CaseError {
    /// Top-level data was not a JSON object.
    #[error("data must be a JSON object")]
    InvalidInput,

    #[error("invalid case direction '{0}': expected toSnakeCase or toCamelCase")]
    InvalidDirection(String),
}

/// No HTTP response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Timeout(_) => TransportError::Timeout,
            other => TransportError::Network(other.to_string()),
        }
    }
}

/// Anything that stops the gateway from producing a real server response.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request payload: {0}")]
    Payload(#[from] CaseError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures of the token store backing the session.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by `AuthService` and `UserService`.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The envelope came back with `ok == false`. `message` is the server's
    /// message when it sent one.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A success body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error(transparent)]
    Case(#[from] CaseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Decode(e.to_string())
    }
}
