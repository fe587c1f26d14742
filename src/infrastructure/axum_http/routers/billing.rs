use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use crate::application::usecases::activation::ActivationUseCase;
use crate::application::usecases::checkout::{CheckoutUseCase, PaymentGateway};
use crate::application::usecases::coupons::CouponUseCase;
use crate::application::usecases::verification::VerificationUseCase;
use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::coupons::CouponRepository;
use crate::domain::repositories::entitlements::EntitlementRepository;
use crate::domain::repositories::payment_orders::PaymentOrderRepository;
use crate::domain::repositories::plans::PlanRepository;
use crate::domain::value_objects::billing::{CheckoutRequest, VerifyRequest};
use crate::infrastructure::axum_http::auth::AuthUser;
use crate::infrastructure::axum_http::error_responses::error_response;
use crate::infrastructure::payments::razorpay_client::RazorpayClient;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::repositories::{
    coupons::CouponPostgres, entitlements::EntitlementPostgres,
    payment_orders::PaymentOrderPostgres, plans::PlanPostgres,
};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Result<Router> {
    let plan_repo = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));
    let coupon_repo = Arc::new(CouponPostgres::new(Arc::clone(&db_pool)));
    let order_repo = Arc::new(PaymentOrderPostgres::new(Arc::clone(&db_pool)));
    let entitlement_repo = Arc::new(EntitlementPostgres::new(Arc::clone(&db_pool)));

    let gateway = Arc::new(RazorpayClient::new(
        config.razorpay.api_base_url.clone(),
        config.razorpay.key_id.clone(),
        config.razorpay.key_secret.clone(),
    )?);

    let coupons = Arc::new(CouponUseCase::new(coupon_repo));
    let activation = Arc::new(ActivationUseCase::new(
        Arc::clone(&plan_repo),
        Arc::clone(&entitlement_repo),
    ));

    let checkout_usecase = Arc::new(CheckoutUseCase::new(
        plan_repo,
        coupons,
        Arc::clone(&order_repo),
        Arc::clone(&activation),
        gateway,
        config.billing.currency.clone(),
        config.razorpay.key_id.clone(),
    ));

    let verification_usecase = Arc::new(VerificationUseCase::new(
        order_repo,
        activation,
        config.razorpay.key_secret.clone(),
    ));

    let checkout_routes = Router::new()
        .route("/plans", get(list_plans))
        .route("/checkout", post(checkout))
        .with_state(checkout_usecase);

    let verify_routes = Router::new()
        .route("/verify", post(verify_payment))
        .with_state(verification_usecase);

    Ok(checkout_routes.merge(verify_routes))
}

pub async fn list_plans<P, C, O, E, G>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<P, C, O, E, G>>>,
    _auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    C: CouponRepository + Send + Sync + 'static,
    O: PaymentOrderRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match checkout_usecase.list_plans().await {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn checkout<P, C, O, E, G>(
    State(checkout_usecase): State<Arc<CheckoutUseCase<P, C, O, E, G>>>,
    auth: AuthUser,
    Json(checkout_request): Json<CheckoutRequest>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    C: CouponRepository + Send + Sync + 'static,
    O: PaymentOrderRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match checkout_usecase
        .checkout(auth.user_id, checkout_request)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

pub async fn verify_payment<O, P, E>(
    State(verification_usecase): State<Arc<VerificationUseCase<O, P, E>>>,
    _auth: AuthUser,
    Json(verify_request): Json<VerifyRequest>,
) -> impl IntoResponse
where
    O: PaymentOrderRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    E: EntitlementRepository + Send + Sync + 'static,
{
    match verification_usecase
        .verify_and_activate(&verify_request, Utc::now())
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}
