use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::plans;

/// Admin-managed reference data. Read-only to this service; edits made
/// elsewhere have no retroactive effect on stored entitlements.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: Option<String>,
    pub original_price_minor: i32,
    pub discounted_price_minor: Option<i32>,
    pub validity_days: i32,
    pub level: i32,
    pub is_active: bool,
}

impl PlanEntity {
    /// Base price in minor units: the discounted override when present.
    pub fn base_price_minor(&self) -> i64 {
        i64::from(
            self.discounted_price_minor
                .unwrap_or(self.original_price_minor),
        )
    }
}
