//! # Roles & Permissions
//!
//! Static role hierarchy and the resource/action permission matrix.
//!
//! ```text
//! owner (4) > admin (3) > cashier (2) > viewer (1)
//! ```
//!
//! The matrix is a pure lookup table. The HTTP layer consults it through
//! [`can`] when permission enforcement is switched on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Role
// =============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Owner,
    Admin,
    Cashier,
    #[default]
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Cashier, Role::Viewer];

    /// Position in the hierarchy. Higher outranks lower.
    pub const fn level(&self) -> u8 {
        match self {
            Role::Owner => 4,
            Role::Admin => 3,
            Role::Cashier => 2,
            Role::Viewer => 1,
        }
    }

    /// True when this role ranks at or above `required`.
    ///
    /// ```rust
    /// use umkm_core::Role;
    ///
    /// assert!(Role::Owner.outranks_or_equals(Role::Admin));
    /// assert!(!Role::Cashier.outranks_or_equals(Role::Admin));
    /// ```
    pub const fn outranks_or_equals(&self, required: Role) -> bool {
        self.level() >= required.level()
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Cashier => "cashier",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Resource & Action
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Resource {
    Dashboard,
    Products,
    Pos,
    Customers,
    Suppliers,
    Transactions,
    Expenses,
    Reports,
    Settings,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

const ALL: &[Role] = &[Role::Owner, Role::Admin, Role::Cashier, Role::Viewer];
const STAFF: &[Role] = &[Role::Owner, Role::Admin, Role::Cashier];
const MANAGERS: &[Role] = &[Role::Owner, Role::Admin];
const OWNER: &[Role] = &[Role::Owner];
const NONE: &[Role] = &[];

/// Roles allowed to perform `action` on `resource`.
///
/// Pairs absent from the matrix (e.g. editing the dashboard) allow nobody.
pub const fn allowed_roles(resource: Resource, action: Action) -> &'static [Role] {
    use Action::*;
    use Resource::*;

    match (resource, action) {
        (Dashboard, View) => ALL,
        (Dashboard, _) => NONE,

        (Products, View) | (Customers, View) => ALL,
        (Products, _) | (Customers, _) => MANAGERS,

        (Pos, View) | (Pos, Create) => STAFF,
        (Pos, _) => NONE,

        (Suppliers, _) => MANAGERS,

        (Transactions, View) | (Transactions, Create) => STAFF,
        (Transactions, Edit) | (Transactions, Delete) => OWNER,

        (Expenses, Delete) => OWNER,
        (Expenses, _) => MANAGERS,

        (Reports, View) => MANAGERS,
        (Reports, _) => NONE,

        (Settings, View) => MANAGERS,
        (Settings, Edit) => OWNER,
        (Settings, _) => NONE,

        (Users, _) => OWNER,
    }
}

/// Whether `role` may perform `action` on `resource`.
pub fn can(role: Role, resource: Resource, action: Action) -> bool {
    allowed_roles(resource, action).contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy() {
        assert!(Role::Owner.level() > Role::Admin.level());
        assert!(Role::Admin.level() > Role::Cashier.level());
        assert!(Role::Cashier.level() > Role::Viewer.level());
        assert!(Role::Viewer.outranks_or_equals(Role::Viewer));
        assert!(!Role::Viewer.outranks_or_equals(Role::Cashier));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("cashier".parse::<Role>().unwrap(), Role::Cashier);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Viewer);
    }

    #[test]
    fn test_matrix() {
        assert!(can(Role::Viewer, Resource::Products, Action::View));
        assert!(!can(Role::Viewer, Resource::Products, Action::Create));
        assert!(can(Role::Admin, Resource::Products, Action::Delete));

        assert!(can(Role::Cashier, Resource::Transactions, Action::Create));
        assert!(!can(Role::Admin, Resource::Transactions, Action::Delete));
        assert!(can(Role::Owner, Resource::Transactions, Action::Delete));

        assert!(!can(Role::Cashier, Resource::Suppliers, Action::View));
        assert!(can(Role::Admin, Resource::Expenses, Action::Edit));
        assert!(!can(Role::Admin, Resource::Expenses, Action::Delete));

        assert!(!can(Role::Cashier, Resource::Reports, Action::View));
        assert!(can(Role::Admin, Resource::Settings, Action::View));
        assert!(!can(Role::Admin, Resource::Settings, Action::Edit));
        assert!(!can(Role::Admin, Resource::Users, Action::View));
        assert!(!can(Role::Owner, Resource::Dashboard, Action::Delete));
    }
}
