use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::coupons::CouponEntity;

/// Read-only: no per-user redemption counting is kept, a coupon stays
/// redeemable while valid.
#[async_trait]
#[automock]
pub trait CouponRepository {
    /// Expects the code already normalized (trimmed, uppercased).
    async fn find_active_by_code(&self, code: &str) -> Result<Option<CouponEntity>>;
}
