//! Role-scoped entry points onto the shared fleet.
//!
//! Sessions hold nothing but an identity and a [`FleetHandle`]; which
//! operations each role exposes is the whole of the permission model.

use std::fmt;

mod admin;
mod renter;

pub use admin::{AdminSession, FullReport, RentalReport};
pub use renter::RenterSession;

/// Who is acting, for audit lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Identity {
    /// Build an identity.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.name, self.id)
    }
}
