//! Membership lookups. Read on every request; never cached.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use tally_core::Membership;

use crate::error::StoreResult;
use crate::store::MembershipStore;
use crate::PgStore;

#[derive(Debug, Clone, sqlx::FromRow)]
struct MembershipRecord {
    tenant_id: String,
    user_id: String,
    role: String,
    is_active: bool,
}

impl From<MembershipRecord> for Membership {
    fn from(r: MembershipRecord) -> Self {
        Membership {
            tenant_id: r.tenant_id,
            user_id: r.user_id,
            role: r.role,
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        MembershipRepository { pool }
    }

    pub async fn find(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Membership>> {
        debug!(tenant_id = %tenant_id, user_id = %user_id, "Looking up membership");

        let record = sqlx::query_as::<_, MembershipRecord>(
            r#"
            SELECT tenant_id, user_id, role, is_active
            FROM tenant_members
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Membership::from))
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    async fn find_membership(&self, tenant_id: &str, user_id: &str) -> StoreResult<Option<Membership>> {
        self.memberships().find(tenant_id, user_id).await
    }
}
