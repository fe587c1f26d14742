use std::sync::Arc;

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::usecases::activation::{ActivationError, ActivationUseCase};
use crate::application::usecases::coupons::{CouponError, CouponUseCase};
use crate::application::usecases::pricing::{self, PricingError};
use crate::domain::entities::coupons::CouponEntity;
use crate::domain::entities::payment_orders::InsertPaymentOrderEntity;
use crate::domain::repositories::coupons::CouponRepository;
use crate::domain::repositories::entitlements::EntitlementRepository;
use crate::domain::repositories::payment_orders::PaymentOrderRepository;
use crate::domain::repositories::plans::PlanRepository;
use crate::domain::value_objects::billing::{CheckoutOutcome, CheckoutRequest, PlanDto};
use crate::domain::value_objects::enums::entitlement_sources::EntitlementSource;
use crate::domain::value_objects::enums::order_statuses::OrderStatus;
use crate::infrastructure::payments::razorpay_client::{GatewayOrder, RazorpayClient};

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait PaymentGateway: Send + Sync {
    /// Creates an order at the gateway. Never retried here: a duplicate
    /// create would double-submit.
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> AnyResult<GatewayOrder>;

    /// Read-only lookup, safe for bounded transport retries. Exists so an
    /// operator can reconcile gateway orders that have no local row (crash
    /// between the create call and the local insert).
    async fn fetch_order(&self, order_id: &str) -> AnyResult<GatewayOrder>;
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> AnyResult<GatewayOrder> {
        self.create_order(amount_minor, currency, receipt).await
    }

    async fn fetch_order(&self, order_id: &str) -> AnyResult<GatewayOrder> {
        self.fetch_order(order_id).await
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("plan not found")]
    PlanNotFound,
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Coupon(#[from] CouponError),
    #[error("payment gateway unavailable")]
    GatewayUnavailable,
    #[error(transparent)]
    Activation(#[from] ActivationError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CheckoutError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CheckoutError::PlanNotFound => StatusCode::NOT_FOUND,
            CheckoutError::Pricing(err) => err.status_code(),
            CheckoutError::Coupon(err) => err.status_code(),
            CheckoutError::GatewayUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            CheckoutError::Activation(err) => err.status_code(),
            CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct CheckoutUseCase<P, C, O, E, G>
where
    P: PlanRepository + Send + Sync + 'static,
    C: CouponRepository + Send + Sync + 'static,
    O: PaymentOrderRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    coupons: Arc<CouponUseCase<C>>,
    order_repo: Arc<O>,
    activation: Arc<ActivationUseCase<P, E>>,
    gateway: Arc<G>,
    currency: String,
    gateway_key_id: String,
}

impl<P, C, O, E, G> CheckoutUseCase<P, C, O, E, G>
where
    P: PlanRepository + Send + Sync + 'static,
    C: CouponRepository + Send + Sync + 'static,
    O: PaymentOrderRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        coupons: Arc<CouponUseCase<C>>,
        order_repo: Arc<O>,
        activation: Arc<ActivationUseCase<P, E>>,
        gateway: Arc<G>,
        currency: String,
        gateway_key_id: String,
    ) -> Self {
        Self {
            plan_repo,
            coupons,
            order_repo,
            activation,
            gateway,
            currency,
            gateway_key_id,
        }
    }

    pub async fn list_plans(&self) -> Result<Vec<PlanDto>, CheckoutError> {
        let plans = self.plan_repo.list_active_plans().await.map_err(|err| {
            error!(db_error = ?err, "checkout: failed to list active plans");
            CheckoutError::Internal(err)
        })?;
        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    /// Prices the plan (with an optional coupon) and either opens a gateway
    /// order or, when the final amount is zero, activates directly. Zero
    /// amounts never reach the gateway.
    pub async fn checkout(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let now = Utc::now();

        info!(
            %user_id,
            plan_id = %request.plan_id,
            coupon_code = ?request.coupon_code,
            "checkout: requested"
        );

        let plan = self
            .plan_repo
            .find_by_id(request.plan_id)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    plan_id = %request.plan_id,
                    db_error = ?err,
                    "checkout: failed to load plan"
                );
                CheckoutError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, plan_id = %request.plan_id, "checkout: plan not found");
                CheckoutError::PlanNotFound
            })?;

        let coupon = match request.coupon_code.as_deref() {
            Some(code) => Some(self.coupons.validate(code, now).await?),
            None => None,
        };

        let amount_minor = pricing::compute_final_price(&plan, coupon.as_ref())?;

        if amount_minor == 0 {
            return self
                .activate_free_redemption(user_id, plan.id, coupon.as_ref(), now)
                .await;
        }

        let amount_minor_i32 =
            i32::try_from(amount_minor).context("final price exceeds storable amount")?;

        // Gateway first, local row second: on gateway failure nothing
        // persists, and a crash in between is visible to an operator via
        // fetch_order against gateway orders missing a local row.
        let receipt = format!("rcpt_{}_{}", user_id.simple(), now.timestamp());
        let gateway_order = self
            .gateway
            .create_order(amount_minor, &self.currency, &receipt)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    plan_id = %plan.id,
                    amount_minor,
                    error = ?err,
                    "checkout: gateway order creation failed"
                );
                CheckoutError::GatewayUnavailable
            })?;

        let order = self
            .order_repo
            .create(InsertPaymentOrderEntity {
                id: gateway_order.id,
                user_id,
                plan_id: plan.id,
                coupon_code: coupon.map(|c| c.code),
                amount_minor: amount_minor_i32,
                currency: self.currency.clone(),
                status: OrderStatus::Created.to_string(),
            })
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    plan_id = %plan.id,
                    db_error = ?err,
                    "checkout: failed to persist payment order"
                );
                CheckoutError::Internal(err)
            })?;

        info!(
            %user_id,
            plan_id = %plan.id,
            order_id = %order.id,
            amount_minor = order.amount_minor,
            "checkout: payment order created"
        );

        Ok(CheckoutOutcome::OrderCreated {
            order_id: order.id,
            amount_minor: order.amount_minor,
            currency: order.currency,
            gateway_key_id: self.gateway_key_id.clone(),
        })
    }

    async fn activate_free_redemption(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        coupon: Option<&CouponEntity>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let idempotency_key = free_redemption_key(user_id, plan_id, coupon, now);

        info!(
            %user_id,
            %plan_id,
            idempotency_key,
            "checkout: zero amount, activating without gateway order"
        );

        let entitlement = self
            .activation
            .activate(
                user_id,
                plan_id,
                EntitlementSource::FreeCoupon,
                &idempotency_key,
                None,
                now,
            )
            .await?;

        Ok(CheckoutOutcome::Activated {
            entitlement: entitlement.into(),
        })
    }
}

/// There is no gateway order id on the free path, so retried redemptions are
/// deduplicated by a deterministic token: same user, plan, coupon and hour
/// bucket collapse onto one entitlement.
fn free_redemption_key(
    user_id: Uuid,
    plan_id: Uuid,
    coupon: Option<&CouponEntity>,
    now: DateTime<Utc>,
) -> String {
    let coupon_code = coupon.map(|c| c.code.as_str()).unwrap_or("none");
    let hour_bucket = now.timestamp() / 3600;
    format!(
        "free:{}:{}:{}:{}",
        user_id.simple(),
        plan_id.simple(),
        coupon_code,
        hour_bucket
    )
}
