use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::entitlements::{EntitlementEntity, InsertEntitlementEntity};

#[async_trait]
#[automock]
pub trait EntitlementRepository {
    /// Atomic insert-or-fetch keyed on (user_id, idempotency_key). A
    /// conflicting insert must not error and must not create a second row;
    /// the existing row comes back instead. Implementations must do this as
    /// one database operation (unique index + ON CONFLICT), never as a
    /// separate check followed by an insert.
    async fn insert_or_fetch(
        &self,
        insert_entitlement: InsertEntitlementEntity,
    ) -> Result<EntitlementEntity>;

    /// All rows for the user that are unexpired at `now` (expires_at null or
    /// in the future). Expiry is evaluated lazily here; there is no sweep job.
    async fn list_effective_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<EntitlementEntity>>;
}
