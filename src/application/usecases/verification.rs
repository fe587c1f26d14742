use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::usecases::activation::{ActivationError, ActivationUseCase};
use crate::domain::entities::payment_orders::PaymentOrderEntity;
use crate::domain::repositories::entitlements::EntitlementRepository;
use crate::domain::repositories::payment_orders::PaymentOrderRepository;
use crate::domain::repositories::plans::PlanRepository;
use crate::domain::value_objects::billing::{VerifiedPaymentDto, VerifyRequest};
use crate::domain::value_objects::enums::entitlement_sources::EntitlementSource;
use crate::domain::value_objects::enums::order_statuses::OrderStatus;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("payment order not found")]
    OrderNotFound,
    #[error("payment signature mismatch")]
    SignatureMismatch,
    #[error("payment order already failed")]
    OrderFailed,
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl VerificationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            VerificationError::OrderNotFound => StatusCode::NOT_FOUND,
            VerificationError::SignatureMismatch => StatusCode::BAD_REQUEST,
            VerificationError::OrderFailed => StatusCode::CONFLICT,
            VerificationError::Activation(err) => err.status_code(),
            VerificationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Sole authority that a payment is genuine. Nothing activates a
/// payment-sourced entitlement without passing through here.
pub struct VerificationUseCase<O, P, E>
where
    O: PaymentOrderRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
{
    order_repo: Arc<O>,
    activation: Arc<ActivationUseCase<P, E>>,
    gateway_secret: String,
}

impl<O, P, E> VerificationUseCase<O, P, E>
where
    O: PaymentOrderRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
{
    pub fn new(
        order_repo: Arc<O>,
        activation: Arc<ActivationUseCase<P, E>>,
        gateway_secret: String,
    ) -> Self {
        Self {
            order_repo,
            activation,
            gateway_secret,
        }
    }

    /// Recomputes HMAC-SHA256 over `order_id|payment_id` and settles the
    /// order. Created orders transition once; verified orders short-circuit
    /// from stored status; failed orders stay failed.
    pub async fn verify_and_activate(
        &self,
        request: &VerifyRequest,
        now: DateTime<Utc>,
    ) -> Result<VerifiedPaymentDto, VerificationError> {
        let order = self
            .order_repo
            .find_by_id(&request.order_id)
            .await
            .map_err(|err| {
                error!(
                    order_id = %request.order_id,
                    db_error = ?err,
                    "verification: failed to load payment order"
                );
                VerificationError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(order_id = %request.order_id, "verification: unknown payment order");
                VerificationError::OrderNotFound
            })?;

        let status = OrderStatus::from_str(&order.status).ok_or_else(|| {
            anyhow::anyhow!("payment order {} has unknown status {}", order.id, order.status)
        })?;

        let verified = match status {
            OrderStatus::Verified => {
                info!(
                    order_id = %order.id,
                    "verification: order already verified, replaying stored result"
                );
                order
            }
            OrderStatus::Failed => {
                warn!(order_id = %order.id, "verification: order already failed, terminal");
                return Err(VerificationError::OrderFailed);
            }
            OrderStatus::Created => self.settle_created_order(order, request).await?,
        };

        let entitlement = self
            .activation
            .activate(
                verified.user_id,
                verified.plan_id,
                EntitlementSource::Payment,
                &verified.id,
                Some(verified.id.clone()),
                now,
            )
            .await?;

        Ok(VerifiedPaymentDto {
            order_id: verified.id,
            status: OrderStatus::Verified,
            entitlement: entitlement.into(),
        })
    }

    async fn settle_created_order(
        &self,
        order: PaymentOrderEntity,
        request: &VerifyRequest,
    ) -> Result<PaymentOrderEntity, VerificationError> {
        if !signature_matches(
            &self.gateway_secret,
            &request.order_id,
            &request.payment_id,
            &request.signature,
        ) {
            // Security event: a callback carrying a bad signature.
            warn!(
                order_id = %order.id,
                payment_id = %request.payment_id,
                "verification: signature mismatch, marking order failed"
            );
            self.order_repo
                .transition_status(&order.id, OrderStatus::Created, OrderStatus::Failed)
                .await
                .map_err(|err| {
                    error!(
                        order_id = %order.id,
                        db_error = ?err,
                        "verification: failed to mark order failed"
                    );
                    VerificationError::Internal(err)
                })?;
            return Err(VerificationError::SignatureMismatch);
        }

        let transitioned = self
            .order_repo
            .transition_status(&order.id, OrderStatus::Created, OrderStatus::Verified)
            .await
            .map_err(|err| {
                error!(
                    order_id = %order.id,
                    db_error = ?err,
                    "verification: failed to mark order verified"
                );
                VerificationError::Internal(err)
            })?;

        match transitioned {
            Some(updated) => {
                info!(order_id = %updated.id, "verification: order verified");
                Ok(updated)
            }
            // Lost the race against a concurrent verify; act on the winner's
            // outcome.
            None => {
                let current = self
                    .order_repo
                    .find_by_id(&order.id)
                    .await
                    .map_err(VerificationError::Internal)?
                    .ok_or_else(|| {
                        VerificationError::Internal(anyhow::anyhow!(
                            "payment order {} vanished during verification",
                            order.id
                        ))
                    })?;
                match OrderStatus::from_str(&current.status) {
                    Some(OrderStatus::Verified) => Ok(current),
                    Some(OrderStatus::Failed) => Err(VerificationError::OrderFailed),
                    _ => Err(VerificationError::Internal(anyhow::anyhow!(
                        "payment order {} stuck in status {}",
                        current.id,
                        current.status
                    ))),
                }
            }
        }
    }
}

/// Constant-time comparison via `Mac::verify_slice`; never a byte-by-byte
/// short-circuit.
fn signature_matches(secret: &str, order_id: &str, payment_id: &str, provided_hex: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());

    let Ok(provided) = hex::decode(provided_hex.trim()) else {
        return false;
    };
    mac.verify_slice(&provided).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::entitlements::{EntitlementEntity, InsertEntitlementEntity};
    use crate::domain::entities::plans::PlanEntity;
    use crate::domain::repositories::entitlements::MockEntitlementRepository;
    use crate::domain::repositories::payment_orders::MockPaymentOrderRepository;
    use crate::domain::repositories::plans::MockPlanRepository;
    use mockall::predicate::eq;
    use uuid::Uuid;

    const SECRET: &str = "test_gateway_secret";

    fn sign(order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn sample_order(order_id: &str, status: OrderStatus) -> PaymentOrderEntity {
        let now = Utc::now();
        PaymentOrderEntity {
            id: order_id.to_string(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            coupon_code: None,
            amount_minor: 499,
            currency: "INR".to_string(),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn activation_with_active_plan(
        plan_id: Uuid,
    ) -> Arc<ActivationUseCase<MockPlanRepository, MockEntitlementRepository>> {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = PlanEntity {
                id: plan_id,
                name: Some("Gold".to_string()),
                original_price_minor: 999,
                discounted_price_minor: None,
                validity_days: 30,
                level: 2,
                is_active: true,
            };
            Box::pin(async move { Ok(Some(plan)) })
        });

        let mut entitlement_repo = MockEntitlementRepository::new();
        entitlement_repo
            .expect_insert_or_fetch()
            .returning(|insert: InsertEntitlementEntity| {
                Box::pin(async move {
                    Ok(EntitlementEntity {
                        id: insert.id,
                        user_id: insert.user_id,
                        plan_id: insert.plan_id,
                        level: insert.level,
                        source: insert.source,
                        activated_at: insert.activated_at,
                        expires_at: insert.expires_at,
                        originating_order_id: insert.originating_order_id,
                        idempotency_key: insert.idempotency_key,
                    })
                })
            });

        Arc::new(ActivationUseCase::new(
            Arc::new(plan_repo),
            Arc::new(entitlement_repo),
        ))
    }

    #[tokio::test]
    async fn valid_signature_verifies_and_activates() {
        let order = sample_order("order_10", OrderStatus::Created);
        let plan_id = order.plan_id;

        let mut order_repo = MockPaymentOrderRepository::new();
        let found = order.clone();
        order_repo
            .expect_find_by_id()
            .with(eq("order_10"))
            .returning(move |_| {
                let found = found.clone();
                Box::pin(async move { Ok(Some(found)) })
            });
        let mut verified = order.clone();
        verified.status = OrderStatus::Verified.to_string();
        order_repo
            .expect_transition_status()
            .with(eq("order_10"), eq(OrderStatus::Created), eq(OrderStatus::Verified))
            .returning(move |_, _, _| {
                let verified = verified.clone();
                Box::pin(async move { Ok(Some(verified)) })
            });

        let usecase = VerificationUseCase::new(
            Arc::new(order_repo),
            activation_with_active_plan(plan_id),
            SECRET.to_string(),
        );

        let request = VerifyRequest {
            order_id: "order_10".to_string(),
            payment_id: "pay_55".to_string(),
            signature: sign("order_10", "pay_55"),
        };

        let result = usecase
            .verify_and_activate(&request, Utc::now())
            .await
            .unwrap();

        assert_eq!(result.status, OrderStatus::Verified);
        assert_eq!(result.entitlement.plan_id, plan_id);
        assert_eq!(result.order_id, "order_10");
    }

    #[tokio::test]
    async fn tampered_signature_always_mismatches() {
        let valid = sign("order_11", "pay_56");

        for position in 0..valid.len() {
            let mut tampered: Vec<char> = valid.chars().collect();
            tampered[position] = if tampered[position] == '0' { '1' } else { '0' };
            let tampered: String = tampered.into_iter().collect();

            assert!(
                !signature_matches(SECRET, "order_11", "pay_56", &tampered),
                "tampered byte at {position} slipped through"
            );
        }
        assert!(signature_matches(SECRET, "order_11", "pay_56", &valid));
    }

    #[tokio::test]
    async fn mismatch_marks_order_failed() {
        let order = sample_order("order_12", OrderStatus::Created);
        let plan_id = order.plan_id;

        let mut order_repo = MockPaymentOrderRepository::new();
        let found = order.clone();
        order_repo.expect_find_by_id().returning(move |_| {
            let found = found.clone();
            Box::pin(async move { Ok(Some(found)) })
        });
        let mut failed = order.clone();
        failed.status = OrderStatus::Failed.to_string();
        order_repo
            .expect_transition_status()
            .with(eq("order_12"), eq(OrderStatus::Created), eq(OrderStatus::Failed))
            .times(1)
            .returning(move |_, _, _| {
                let failed = failed.clone();
                Box::pin(async move { Ok(Some(failed)) })
            });

        let usecase = VerificationUseCase::new(
            Arc::new(order_repo),
            activation_with_active_plan(plan_id),
            SECRET.to_string(),
        );

        let request = VerifyRequest {
            order_id: "order_12".to_string(),
            payment_id: "pay_57".to_string(),
            signature: "deadbeef".to_string(),
        };

        let result = usecase.verify_and_activate(&request, Utc::now()).await;
        assert!(matches!(result, Err(VerificationError::SignatureMismatch)));
    }

    #[tokio::test]
    async fn already_verified_order_short_circuits() {
        let order = sample_order("order_13", OrderStatus::Verified);
        let plan_id = order.plan_id;

        // No transition_status expectation: a second verify must not touch
        // the stored status again.
        let mut order_repo = MockPaymentOrderRepository::new();
        let found = order.clone();
        order_repo.expect_find_by_id().returning(move |_| {
            let found = found.clone();
            Box::pin(async move { Ok(Some(found)) })
        });

        let usecase = VerificationUseCase::new(
            Arc::new(order_repo),
            activation_with_active_plan(plan_id),
            SECRET.to_string(),
        );

        let request = VerifyRequest {
            order_id: "order_13".to_string(),
            payment_id: "pay_58".to_string(),
            signature: sign("order_13", "pay_58"),
        };

        let result = usecase
            .verify_and_activate(&request, Utc::now())
            .await
            .unwrap();

        assert_eq!(result.status, OrderStatus::Verified);
    }

    #[tokio::test]
    async fn failed_order_never_re_transitions() {
        let order = sample_order("order_14", OrderStatus::Failed);
        let plan_id = order.plan_id;

        let mut order_repo = MockPaymentOrderRepository::new();
        let found = order.clone();
        order_repo.expect_find_by_id().returning(move |_| {
            let found = found.clone();
            Box::pin(async move { Ok(Some(found)) })
        });

        let usecase = VerificationUseCase::new(
            Arc::new(order_repo),
            activation_with_active_plan(plan_id),
            SECRET.to_string(),
        );

        // Even a now-valid signature cannot revive a failed order.
        let request = VerifyRequest {
            order_id: "order_14".to_string(),
            payment_id: "pay_59".to_string(),
            signature: sign("order_14", "pay_59"),
        };

        let result = usecase.verify_and_activate(&request, Utc::now()).await;
        assert!(matches!(result, Err(VerificationError::OrderFailed)));
    }

    #[tokio::test]
    async fn unknown_order_is_rejected() {
        let mut order_repo = MockPaymentOrderRepository::new();
        order_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = VerificationUseCase::new(
            Arc::new(order_repo),
            activation_with_active_plan(Uuid::new_v4()),
            SECRET.to_string(),
        );

        let request = VerifyRequest {
            order_id: "order_missing".to_string(),
            payment_id: "pay_60".to_string(),
            signature: sign("order_missing", "pay_60"),
        };

        let result = usecase.verify_and_activate(&request, Utc::now()).await;
        assert!(matches!(result, Err(VerificationError::OrderNotFound)));
    }

    #[tokio::test]
    async fn lost_transition_race_follows_winner_outcome() {
        let order = sample_order("order_15", OrderStatus::Created);
        let plan_id = order.plan_id;

        let mut order_repo = MockPaymentOrderRepository::new();
        let created = order.clone();
        let mut verified = order.clone();
        verified.status = OrderStatus::Verified.to_string();
        let re_read = verified.clone();

        let mut call = 0;
        order_repo.expect_find_by_id().returning(move |_| {
            call += 1;
            let row = if call == 1 {
                created.clone()
            } else {
                re_read.clone()
            };
            Box::pin(async move { Ok(Some(row)) })
        });
        order_repo
            .expect_transition_status()
            .returning(|_, _, _| Box::pin(async { Ok(None) }));

        let usecase = VerificationUseCase::new(
            Arc::new(order_repo),
            activation_with_active_plan(plan_id),
            SECRET.to_string(),
        );

        let request = VerifyRequest {
            order_id: "order_15".to_string(),
            payment_id: "pay_61".to_string(),
            signature: sign("order_15", "pay_61"),
        };

        let result = usecase
            .verify_and_activate(&request, Utc::now())
            .await
            .unwrap();

        assert_eq!(result.status, OrderStatus::Verified);
    }
}
