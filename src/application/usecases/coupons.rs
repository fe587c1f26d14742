use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::entities::coupons::CouponEntity;
use crate::domain::repositories::coupons::CouponRepository;

#[derive(Debug, Error)]
pub enum CouponError {
    #[error("coupon not found")]
    NotFound,
    #[error("coupon has expired")]
    Expired,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CouponError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CouponError::NotFound => StatusCode::NOT_FOUND,
            CouponError::Expired => StatusCode::GONE,
            CouponError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct CouponUseCase<C>
where
    C: CouponRepository + Send + Sync + 'static,
{
    coupon_repo: Arc<C>,
}

impl<C> CouponUseCase<C>
where
    C: CouponRepository + Send + Sync + 'static,
{
    pub fn new(coupon_repo: Arc<C>) -> Self {
        Self { coupon_repo }
    }

    /// Codes are stored uppercase, so lookups normalize first. Pure lookup
    /// plus a freshness check; nothing about usage state is mutated.
    pub async fn validate(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<CouponEntity, CouponError> {
        let normalized = normalize_code(code);

        let coupon = self
            .coupon_repo
            .find_active_by_code(&normalized)
            .await
            .map_err(|err| {
                error!(
                    coupon_code = %normalized,
                    db_error = ?err,
                    "coupons: failed to look up coupon"
                );
                CouponError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(coupon_code = %normalized, "coupons: no active coupon for code");
                CouponError::NotFound
            })?;

        if let Some(expires_at) = coupon.expires_at {
            if expires_at <= now {
                warn!(
                    coupon_code = %normalized,
                    %expires_at,
                    "coupons: coupon past expiry"
                );
                return Err(CouponError::Expired);
            }
        }

        info!(
            coupon_code = %normalized,
            discount_percent = coupon.discount_percent,
            "coupons: coupon validated"
        );

        Ok(coupon)
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::coupons::MockCouponRepository;
    use chrono::Duration;
    use mockall::predicate::eq;

    fn sample_coupon(code: &str, expires_at: Option<DateTime<Utc>>) -> CouponEntity {
        CouponEntity {
            code: code.to_string(),
            discount_percent: 20,
            is_active: true,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn normalizes_code_before_lookup() {
        let mut coupon_repo = MockCouponRepository::new();
        let coupon = sample_coupon("WELCOME20", None);

        coupon_repo
            .expect_find_active_by_code()
            .with(eq("WELCOME20"))
            .returning(move |_| {
                let coupon = coupon.clone();
                Box::pin(async move { Ok(Some(coupon)) })
            });

        let usecase = CouponUseCase::new(Arc::new(coupon_repo));
        let validated = usecase.validate("  welcome20 ", Utc::now()).await.unwrap();

        assert_eq!(validated.code, "WELCOME20");
    }

    #[tokio::test]
    async fn missing_coupon_is_not_found() {
        let mut coupon_repo = MockCouponRepository::new();
        coupon_repo
            .expect_find_active_by_code()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = CouponUseCase::new(Arc::new(coupon_repo));
        let result = usecase.validate("NOPE", Utc::now()).await;

        assert!(matches!(result, Err(CouponError::NotFound)));
    }

    #[tokio::test]
    async fn past_expiry_is_rejected() {
        let now = Utc::now();
        let mut coupon_repo = MockCouponRepository::new();
        let coupon = sample_coupon("OLD", Some(now - Duration::hours(1)));

        coupon_repo.expect_find_active_by_code().returning(move |_| {
            let coupon = coupon.clone();
            Box::pin(async move { Ok(Some(coupon)) })
        });

        let usecase = CouponUseCase::new(Arc::new(coupon_repo));
        let result = usecase.validate("OLD", now).await;

        assert!(matches!(result, Err(CouponError::Expired)));
    }

    #[tokio::test]
    async fn future_expiry_is_accepted() {
        let now = Utc::now();
        let mut coupon_repo = MockCouponRepository::new();
        let coupon = sample_coupon("FRESH", Some(now + Duration::hours(1)));

        coupon_repo.expect_find_active_by_code().returning(move |_| {
            let coupon = coupon.clone();
            Box::pin(async move { Ok(Some(coupon)) })
        });

        let usecase = CouponUseCase::new(Arc::new(coupon_repo));
        assert!(usecase.validate("FRESH", now).await.is_ok());
    }
}
