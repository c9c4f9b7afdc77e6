//! Login, registration, token refresh and session checks.
//!
//! # Design
//! `AuthService` is composed over any `Gateway` and shares the gateway's
//! `TokenStore`: it is the only writer of the token, the gateway's
//! interceptor is its only reader. Non-ok envelopes become
//! `ServiceError::Rejected` through `Envelope::into_result`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::gateway::Gateway;
use crate::token::{is_expired, TokenStore};
use crate::types::{confirmation, from_wire, Confirmation, Credentials, LoginResponse, Profile, Registration};

pub struct AuthService<G> {
    gateway: G,
    tokens: Arc<dyn TokenStore>,
}

impl<G: Gateway> AuthService<G> {
    pub fn new(gateway: G, tokens: Arc<dyn TokenStore>) -> Self {
        Self { gateway, tokens }
    }

    /// Exchange credentials for an access token and store it.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ServiceError> {
        let credentials = serde_json::to_value(Credentials {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let body = self
            .gateway
            .post("/auth/login", Some(credentials))
            .into_result("Login failed.")
            .inspect_err(|e| warn!(error = %e, "Login error"))?;

        let login: LoginResponse = from_wire(&body)?;
        self.tokens.set(&login.access_token)?;
        info!(email, "Logged in");
        Ok(login)
    }

    pub fn register(&self, registration: &Registration) -> Result<Confirmation, ServiceError> {
        let payload = serde_json::to_value(registration)?;
        let body = self
            .gateway
            .post("/auth/register", Some(payload))
            .into_result("Registration failed.")
            .inspect_err(|e| warn!(error = %e, "Registration error"))?;
        confirmation(&body)
    }

    /// Obtain a fresh access token. The refresh credential is the cookie the
    /// server set at login, so this needs a gateway that includes
    /// credentials.
    pub fn refresh(&self) -> Result<(), ServiceError> {
        let body = self
            .gateway
            .post("/auth/refresh", None)
            .into_result("Failed to refresh token.")
            .inspect_err(|e| warn!(error = %e, "Token refresh error"))?;

        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| ServiceError::Decode("missing access_token".to_string()))?;
        self.tokens.set(token)?;
        Ok(())
    }

    /// Drop the stored token. Purely client side.
    pub fn logout(&self) -> Result<(), ServiceError> {
        self.tokens.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// A token is stored and its `exp` claim is still in the future.
    pub fn is_authenticated(&self) -> bool {
        self.tokens
            .get()
            .is_some_and(|token| !is_expired(&token, Utc::now().timestamp()))
    }

    /// Ask the server who the stored token belongs to.
    pub fn validate_session(&self) -> Result<Profile, ServiceError> {
        let body = self
            .gateway
            .get("/user/profile")
            .into_result("Failed to get current user.")?;
        let data = body
            .get("data")
            .ok_or_else(|| ServiceError::Decode("missing data".to_string()))?;
        from_wire(data)
    }

    /// Startup check. No token, an expired token, or a token the server
    /// refuses all mean "signed out".
    pub fn restore_session(&self) -> Result<Option<Profile>, ServiceError> {
        if !self.is_authenticated() {
            return Ok(None);
        }
        match self.validate_session() {
            Ok(profile) => Ok(Some(profile)),
            Err(ServiceError::Rejected { status: 401 | 422, message }) => {
                warn!(%message, "Stored session was rejected");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
