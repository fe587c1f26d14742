use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::entitlements::{EntitlementEntity, InsertEntitlementEntity};
use crate::domain::repositories::entitlements::EntitlementRepository;
use crate::domain::repositories::plans::PlanRepository;
use crate::domain::value_objects::enums::entitlement_sources::EntitlementSource;

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("plan is not active")]
    PlanInactive,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ActivationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ActivationError::PlanNotFound => StatusCode::NOT_FOUND,
            ActivationError::PlanInactive => StatusCode::UNPROCESSABLE_ENTITY,
            ActivationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts a verified payment or a zero-cost coupon redemption into a
/// stored entitlement, exactly once per (user_id, idempotency_key).
pub struct ActivationUseCase<P, E>
where
    P: PlanRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    entitlement_repo: Arc<E>,
}

impl<P, E> ActivationUseCase<P, E>
where
    P: PlanRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
{
    pub fn new(plan_repo: Arc<P>, entitlement_repo: Arc<E>) -> Self {
        Self {
            plan_repo,
            entitlement_repo,
        }
    }

    /// Verification callbacks can arrive more than once (client retry,
    /// network duplicate, refresh). The repository's insert-or-fetch on the
    /// (user_id, idempotency_key) unique index absorbs replays: a second
    /// call returns the row the first one created, as success.
    pub async fn activate(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        source: EntitlementSource,
        idempotency_key: &str,
        originating_order_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<EntitlementEntity, ActivationError> {
        // Re-read the plan here rather than trusting the copy priced
        // earlier; the admin may have deactivated it in between.
        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %plan_id,
                    db_error = ?err,
                    "activation: failed to load plan"
                );
                ActivationError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, %plan_id, "activation: plan not found");
                ActivationError::PlanNotFound
            })?;

        if !plan.is_active {
            warn!(%user_id, %plan_id, "activation: plan inactive at activation time");
            return Err(ActivationError::PlanInactive);
        }

        let expires_at = if plan.validity_days > 0 {
            Some(now + Duration::days(i64::from(plan.validity_days)))
        } else {
            None
        };

        let candidate_id = Uuid::new_v4();
        let entitlement = self
            .entitlement_repo
            .insert_or_fetch(InsertEntitlementEntity {
                id: candidate_id,
                user_id,
                plan_id,
                level: plan.level,
                source: source.to_string(),
                activated_at: now,
                expires_at,
                originating_order_id,
                idempotency_key: idempotency_key.to_string(),
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    %plan_id,
                    idempotency_key,
                    db_error = ?err,
                    "activation: insert-or-fetch failed"
                );
                ActivationError::Internal(err)
            })?;

        if entitlement.id == candidate_id {
            info!(
                %user_id,
                %plan_id,
                entitlement_id = %entitlement.id,
                source = %source,
                expires_at = ?entitlement.expires_at,
                "activation: entitlement activated"
            );
        } else {
            info!(
                %user_id,
                %plan_id,
                entitlement_id = %entitlement.id,
                idempotency_key,
                "activation: duplicate activation absorbed, returning existing entitlement"
            );
        }

        Ok(entitlement)
    }
}
