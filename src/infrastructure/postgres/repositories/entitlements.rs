use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, insert_into, prelude::*};
use uuid::Uuid;

use crate::domain::entities::entitlements::{EntitlementEntity, InsertEntitlementEntity};
use crate::domain::repositories::entitlements::EntitlementRepository;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::entitlements};

pub struct EntitlementPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl EntitlementPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EntitlementRepository for EntitlementPostgres {
    async fn insert_or_fetch(
        &self,
        insert_entitlement: InsertEntitlementEntity,
    ) -> Result<EntitlementEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user_id = insert_entitlement.user_id;
        let idempotency_key = insert_entitlement.idempotency_key.clone();

        // The unique index on (user_id, idempotency_key) does the real work:
        // concurrent duplicates collapse onto whichever insert won, and the
        // follow-up select returns that winner.
        let result = conn.transaction::<EntitlementEntity, anyhow::Error, _>(|conn| {
            insert_into(entitlements::table)
                .values(&insert_entitlement)
                .on_conflict((entitlements::user_id, entitlements::idempotency_key))
                .do_nothing()
                .execute(conn)?;

            let row = entitlements::table
                .filter(entitlements::user_id.eq(user_id))
                .filter(entitlements::idempotency_key.eq(&idempotency_key))
                .select(EntitlementEntity::as_select())
                .first::<EntitlementEntity>(conn)?;

            Ok(row)
        })?;

        Ok(result)
    }

    async fn list_effective_for_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<EntitlementEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = entitlements::table
            .filter(entitlements::user_id.eq(user_id))
            .filter(
                entitlements::expires_at
                    .is_null()
                    .or(entitlements::expires_at.gt(now)),
            )
            .select(EntitlementEntity::as_select())
            .load::<EntitlementEntity>(&mut conn)?;

        Ok(results)
    }
}
