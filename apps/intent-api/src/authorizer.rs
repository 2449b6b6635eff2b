//! Tenant membership and role checks.
//!
//! The caller's claimed role never reaches this module: the role is read
//! from the membership row on every request, without caching.
//!
//! ```text
//! ExecutionContext ──► find_membership(tenant, user)
//!                         │ none / inactive ──► AuthError::NotMember (403)
//!                         │ store failure   ──► AuthError::Store     (500)
//!                         ▼
//!                    AuthorizedContext { role: VerifiedRole }
//!                         │
//!                         ▼
//!                    is_permitted(role, intent)
//!                         │ no ──► AuthError::Forbidden (403)
//!                         ▼
//!                      dispatch
//! ```

use tracing::{debug, warn};

use tally_core::permissions::is_permitted;
use tally_core::{AuthorizedContext, ExecutionContext, Intent};
use tally_db::Store;

use crate::error::AuthError;

/// Resolves the caller's membership in the tenant.
pub async fn verify_membership(
    store: &dyn Store,
    context: ExecutionContext,
) -> Result<AuthorizedContext, AuthError> {
    let membership = store
        .find_membership(&context.tenant_id, &context.user_id)
        .await
        .map_err(|e| {
            warn!(tenant_id = %context.tenant_id, error = %e, "Membership lookup failed");
            AuthError::Store(e)
        })?;

    match membership {
        Some(m) if m.is_active => {
            if !context.role.as_str().is_empty() && !context.role.as_str().eq_ignore_ascii_case(&m.role) {
                debug!(
                    claimed = context.role.as_str(),
                    actual = %m.role,
                    "Claimed role differs from membership; using membership"
                );
            }
            Ok(AuthorizedContext::new(context, &m))
        }
        _ => {
            debug!(tenant_id = %context.tenant_id, user_id = %context.user_id, "No active membership");
            Err(AuthError::NotMember)
        }
    }
}

/// Checks the verified role against the permission table.
pub fn check_permission(context: &AuthorizedContext, intent: Intent) -> Result<(), AuthError> {
    if is_permitted(&context.role, intent) {
        Ok(())
    } else {
        Err(AuthError::Forbidden {
            role: context.role.to_string(),
            intent,
        })
    }
}
