use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::plans::PlanEntity;
use crate::domain::value_objects::entitlements::EntitlementDto;
use crate::domain::value_objects::enums::order_statuses::OrderStatus;

#[derive(Debug, Serialize)]
pub struct PlanDto {
    pub id: Uuid,
    pub name: Option<String>,
    pub original_price_minor: i32,
    pub discounted_price_minor: Option<i32>,
    pub validity_days: i32,
    pub level: i32,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            original_price_minor: value.original_price_minor,
            discounted_price_minor: value.discounted_price_minor,
            validity_days: value.validity_days,
            level: value.level,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan_id: Uuid,
    pub coupon_code: Option<String>,
}

/// A checkout either opens a gateway order (payable amount) or, for a fully
/// discounted plan, activates the entitlement directly.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    OrderCreated {
        order_id: String,
        amount_minor: i32,
        currency: String,
        gateway_key_id: String,
    },
    Activated {
        entitlement: EntitlementDto,
    },
}

/// Strict callback shape. Serde rejects any payload missing one of the
/// required fields, so nothing downstream has to probe for presence.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifiedPaymentDto {
    pub order_id: String,
    pub status: OrderStatus,
    pub entitlement: EntitlementDto,
}
