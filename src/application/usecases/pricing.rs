use thiserror::Error;

use crate::domain::entities::coupons::CouponEntity;
use crate::domain::entities::plans::PlanEntity;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
}

impl PricingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            PricingError::InvalidPlan(_) => axum::http::StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

/// Final payable amount in minor units for a plan plus an optional coupon.
///
/// Base is the discounted override when present, else the original price.
/// The coupon discount is floor(base * percent / 100); integer division on
/// non-negative operands gives the floor. Pure function, no side effects.
pub fn compute_final_price(
    plan: &PlanEntity,
    coupon: Option<&CouponEntity>,
) -> Result<i64, PricingError> {
    if !plan.is_active {
        return Err(PricingError::InvalidPlan(format!(
            "plan {} is not active",
            plan.id
        )));
    }

    let base = plan.base_price_minor();
    if base <= 0 && plan.level > 0 {
        // A privileged plan priced at or below zero is reference-data
        // corruption, not a free plan.
        return Err(PricingError::InvalidPlan(format!(
            "plan {} has level {} but base price {}",
            plan.id, plan.level, base
        )));
    }

    let final_price = match coupon {
        Some(coupon) => {
            let percent = i64::from(coupon.discount_percent.clamp(0, 100));
            let discount = base * percent / 100;
            (base - discount).max(0)
        }
        None => base,
    };

    Ok(final_price)
}
