use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::entitlements;

/// Append-only. A unique index on (user_id, idempotency_key) is the
/// double-activation guard; rows are superseded by later rows, never mutated.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = entitlements)]
pub struct EntitlementEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub level: i32,
    pub source: String,
    pub activated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub originating_order_id: Option<String>,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = entitlements)]
pub struct InsertEntitlementEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub level: i32,
    pub source: String,
    pub activated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub originating_order_id: Option<String>,
    pub idempotency_key: String,
}
