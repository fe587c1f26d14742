use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::entitlements::EntitlementEntity;

#[derive(Debug, Clone, Serialize)]
pub struct EntitlementDto {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub level: i32,
    pub source: String,
    pub activated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<EntitlementEntity> for EntitlementDto {
    fn from(value: EntitlementEntity) -> Self {
        Self {
            id: value.id,
            plan_id: value.plan_id,
            level: value.level,
            source: value.source,
            activated_at: value.activated_at,
            expires_at: value.expires_at,
        }
    }
}

/// Effective view over possibly-overlapping entitlement rows at a point in
/// time. Level 0 means no live entitlement.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EffectiveEntitlement {
    pub level: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_premium: bool,
}

#[derive(Debug, Serialize)]
pub struct AccessDecision {
    pub content_type: String,
    pub allowed: bool,
}
