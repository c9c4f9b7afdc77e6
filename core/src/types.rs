//! Account DTOs in UI form.
//!
//! # Design
//! Field names serialize as camelCase, the shape UI state uses. The gateway
//! converts them to snake_case on the way out, and services convert server
//! bodies back to camelCase before deserializing into these types, so the
//! wire convention never leaks into them.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServiceError;
use crate::keycase::{convert_keys, Direction};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Payload for creating an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// ISO date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_menstruation: Option<bool>,
}

/// The signed-in user's personal details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub birthdate: Option<String>,
    #[serde(default)]
    pub has_menstruation: Option<bool>,
}

/// Partial profile update. Omitted fields stay unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_menstruation: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of write endpoints that only acknowledge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Confirmation {
    #[serde(default)]
    pub message: Option<String>,
}

/// Convert a server body to camelCase and deserialize it.
pub(crate) fn from_wire<T: DeserializeOwned>(body: &Value) -> Result<T, ServiceError> {
    let camel = convert_keys(body, Direction::ToCamelCase)?;
    Ok(serde_json::from_value(camel)?)
}

/// Acknowledgement bodies are optional; anything that is not an object
/// reads as an empty confirmation.
pub(crate) fn confirmation(body: &Value) -> Result<Confirmation, ServiceError> {
    if body.is_object() {
        from_wire(body)
    } else {
        Ok(Confirmation::default())
    }
}
