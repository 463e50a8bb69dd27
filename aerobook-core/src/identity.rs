use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BookingError, BookingResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Passenger,
    Admin,
}

/// An authenticated caller, as handed over by the external auth collaborator.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub token: String,
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Resolve an optional identity, failing before any request is issued.
    pub fn require(identity: Option<&Identity>) -> BookingResult<&Identity> {
        match identity {
            Some(id) if !id.token.is_empty() => Ok(id),
            Some(id) => {
                tracing::debug!("Identity for {} carries an empty token", id.user_id);
                Err(BookingError::Unauthorized("Empty bearer token".to_string()))
            }
            None => Err(BookingError::Unauthorized("Sign in first".to_string())),
        }
    }

    pub fn require_admin(identity: Option<&Identity>) -> BookingResult<&Identity> {
        let id = Self::require(identity)?;
        if !id.is_admin() {
            return Err(BookingError::Unauthorized(
                "Forbidden: Admin access required".to_string(),
            ));
        }
        Ok(id)
    }
}

// Keep the token out of logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("token", &"***")
            .field("role", &self.role)
            .finish()
    }
}
