//! Identity handling.
//!
//! Authentication itself is the job of an external identity provider;
//! the core only verifies the bearer token it issued and trusts the
//! `{subject, role}` claim verbatim. No handler ever re-derives identity.

mod token;

pub use token::{AnyToken, AuthToken, Claims, Role, AUTH_HEADER};

use crate::model::db::voter::Voter;

/// A principal type that an [`AuthToken`] can represent.
pub trait Principal {
    const ROLE: Role;
}

/// Marker for administrator principals. Admin accounts live entirely in
/// the identity provider, so unlike voters there is no backing document.
pub struct Admin;

impl Principal for Admin {
    const ROLE: Role = Role::Admin;
}

impl Principal for Voter {
    const ROLE: Role = Role::Voter;
}
