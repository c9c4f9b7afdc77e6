//! Client core for the seizure tracker API.
//!
//! # Overview
//! Every network call goes through `ApiGateway`, which attaches the session's
//! bearer token, converts body keys from camelCase to the backend's
//! snake_case, and folds every outcome (success, HTTP error, dead network)
//! into an `Envelope`. `AuthService` and `UserService` sit on top and turn
//! non-ok envelopes into `ServiceError`s.
//!
//! # Design
//! - `keycase` is pure and has no I/O.
//! - Request building is pure; `Transport` is the only I/O seam, so tests
//!   run the whole pipeline against scripted responses.
//! - The access token lives in an explicit `TokenStore` shared by the
//!   gateway (reader) and `AuthService` (writer).
//! - Services depend on the `Gateway` trait, not on a concrete client.

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod http;
pub mod keycase;
pub mod token;
pub mod transport;
pub mod types;
pub mod user;

#[cfg(test)]
mod mock;

pub use auth::AuthService;
pub use config::{GatewayConfig, DEFAULT_MAX_BODY_BYTES};
pub use envelope::Envelope;
pub use error::{CaseError, GatewayError, ServiceError, StoreError, TransportError};
pub use gateway::{convert_keys_for_method, ApiGateway, CallOptions, Gateway, QueryValue, RequestOptions};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use keycase::{convert_keys, convert_keys_str, to_camel_case, to_snake_case, Direction};
pub use token::{is_expired, token_expiry, FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{Transport, UreqTransport};
pub use types::{Confirmation, Credentials, LoginResponse, PasswordChange, Profile, ProfileUpdate, Registration};
pub use user::UserService;
