//! # Execution Context and Roles
//!
//! Who is asking, and in which business.
//!
//! ## Two Kinds of Role
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP body                         Store (tenant_members row)           │
//! │  context.role: "admin"             role: "cashier"                      │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  UnverifiedRole                     VerifiedRole                        │
//! │  (logged, never consulted)          (the only input to permissions)     │
//! │                                                                         │
//! │  There is no From/Into between them. A VerifiedRole can only be built  │
//! │  from a Membership, so handlers cannot see a caller-claimed role.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Membership;

// =============================================================================
// Role
// =============================================================================

/// Known membership roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
    Staff,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
            Role::Staff => "staff",
            Role::Viewer => "viewer",
        }
    }

    /// Exact, case-insensitive role name. Anything else is `None`.
    pub fn parse(name: &str) -> Option<Role> {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "cashier" => Some(Role::Cashier),
            "staff" => Some(Role::Staff),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

/// Role as claimed by the caller. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnverifiedRole(String);

impl UnverifiedRole {
    pub fn new(raw: impl Into<String>) -> Self {
        UnverifiedRole(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Role read from the caller's membership row.
///
/// `role()` is `None` for role strings outside [`Role`]; such callers are
/// permitted nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRole {
    raw: String,
    role: Option<Role>,
}

impl VerifiedRole {
    pub fn from_membership(membership: &Membership) -> Self {
        VerifiedRole {
            raw: membership.role.clone(),
            role: Role::parse(&membership.role),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for VerifiedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// =============================================================================
// Contexts
// =============================================================================

/// Context block of an execute request, exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub tenant_id: String,
    pub user_id: String,
    #[serde(default)]
    pub role: UnverifiedRole,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Context handed to handlers after authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedContext {
    pub tenant_id: String,
    pub user_id: String,
    pub display_name: String,
    pub role: VerifiedRole,
}

impl AuthorizedContext {
    /// Binds a request context to the membership that was found for it.
    /// The claimed role is discarded.
    pub fn new(context: ExecutionContext, membership: &Membership) -> Self {
        let display_name = context
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| context.user_id.clone());
        AuthorizedContext {
            tenant_id: context.tenant_id,
            user_id: context.user_id,
            display_name,
            role: VerifiedRole::from_membership(membership),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(role: &str) -> Membership {
        Membership {
            tenant_id: "t1".into(),
            user_id: "u1".into(),
            role: role.into(),
            is_active: true,
        }
    }

    #[test]
    fn test_claimed_role_is_replaced_by_membership_role() {
        let ctx = ExecutionContext {
            tenant_id: "t1".into(),
            user_id: "u1".into(),
            role: UnverifiedRole::new("admin"),
            display_name: Some("Wanjiru".into()),
        };
        let authorized = AuthorizedContext::new(ctx, &membership("cashier"));
        assert_eq!(authorized.role.role(), Some(Role::Cashier));
        assert_eq!(authorized.display_name, "Wanjiru");
    }

    #[test]
    fn test_unknown_membership_role_has_no_role() {
        let role = VerifiedRole::from_membership(&membership("owner"));
        assert_eq!(role.role(), None);
        assert_eq!(role.as_str(), "owner");
    }

    #[test]
    fn test_display_name_falls_back_to_user_id() {
        let ctx = ExecutionContext {
            tenant_id: "t1".into(),
            user_id: "u1".into(),
            role: UnverifiedRole::default(),
            display_name: Some("   ".into()),
        };
        let authorized = AuthorizedContext::new(ctx, &membership("staff"));
        assert_eq!(authorized.display_name, "u1");
    }

    #[test]
    fn test_context_deserializes_without_optional_fields() {
        let ctx: ExecutionContext =
            serde_json::from_str(r#"{"tenant_id":"t1","user_id":"u1"}"#).unwrap();
        assert_eq!(ctx.role.as_str(), "");
        assert!(ctx.display_name.is_none());
    }
}
