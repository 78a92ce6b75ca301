use crate::core::{AppError, Result};
use std::fmt;

/// Authenticated principal behind a state change.
///
/// Every mutating operation on a transaction takes an `Actor`; the identity is
/// written to the audit columns (`reviewed_by`, `approved_by`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// Back-office user authenticated by the admin key middleware
    Admin(String),
    /// Payment gateway whose webhook signature has been verified
    Gateway(String),
}

impl Actor {
    pub fn admin(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AppError::unauthorized("Admin identity is required"));
        }
        Ok(Actor::Admin(id))
    }

    /// Gateway identities are recorded as `<gateway>-webhook`
    pub fn gateway(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(AppError::unauthorized("Gateway identity is required"));
        }
        Ok(Actor::Gateway(format!("{}-webhook", name)))
    }

    pub fn identity(&self) -> &str {
        match self {
            Actor::Admin(id) | Actor::Gateway(id) => id,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin(_))
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identity())
    }
}
