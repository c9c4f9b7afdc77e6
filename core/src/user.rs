use tracing::warn;

use crate::error::ServiceError;
use crate::gateway::Gateway;
use crate::types::{confirmation, from_wire, Confirmation, PasswordChange, Profile, ProfileUpdate};

/// Profile operations for the signed-in user.
pub struct UserService<G> {
    gateway: G,
}

impl<G: Gateway> UserService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// The server wraps the profile in `data`.
    pub fn profile(&self) -> Result<Profile, ServiceError> {
        let body = self
            .gateway
            .get("/user/profile")
            .into_result("Failed to retrieve user profile.")?;
        let data = body
            .get("data")
            .ok_or_else(|| ServiceError::Decode("missing data".to_string()))?;
        from_wire(data)
    }

    pub fn update_profile(&self, update: &ProfileUpdate) -> Result<Confirmation, ServiceError> {
        let payload = serde_json::to_value(update)?;
        let body = self
            .gateway
            .put("/user/profile", payload)
            .into_result("Failed to update user profile.")
            .inspect_err(|e| warn!(error = %e, "Update profile error"))?;
        confirmation(&body)
    }

    pub fn change_password(&self, old_password: &str, new_password: &str) -> Result<Confirmation, ServiceError> {
        let payload = serde_json::to_value(PasswordChange {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        })?;
        let body = self
            .gateway
            .put("/user/change-password", payload)
            .into_result("Failed to change password.")?;
        confirmation(&body)
    }

    pub fn delete_account(&self) -> Result<Confirmation, ServiceError> {
        let body = self
            .gateway
            .delete("/user/delete-account")
            .into_result("Failed to delete account.")?;
        confirmation(&body)
    }
}
