use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use tracing::error;

use crate::application::usecases::entitlement_resolver::EntitlementResolver;
use crate::domain::repositories::entitlements::EntitlementRepository;
use crate::domain::value_objects::entitlements::AccessDecision;
use crate::domain::value_objects::enums::content_types::ContentType;
use crate::infrastructure::axum_http::auth::AuthUser;
use crate::infrastructure::axum_http::error_responses::error_response;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::repositories::entitlements::EntitlementPostgres;

pub fn routes(db_pool: Arc<PgPoolSquad>, premium_level_threshold: i32) -> Router {
    let entitlement_repo = Arc::new(EntitlementPostgres::new(db_pool));
    let resolver = Arc::new(EntitlementResolver::new(
        entitlement_repo,
        premium_level_threshold,
    ));

    Router::new()
        .route("/current", get(current_entitlement))
        .route("/access/:content_type", get(can_access))
        .with_state(resolver)
}

pub async fn current_entitlement<E>(
    State(resolver): State<Arc<EntitlementResolver<E>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    E: EntitlementRepository + Send + Sync + 'static,
{
    match resolver.current_entitlement(auth.user_id, Utc::now()).await {
        Ok(effective) => (StatusCode::OK, Json(effective)).into_response(),
        Err(err) => error_response(err.status_code(), err.to_string()),
    }
}

/// Gating endpoint for download/like/badge call sites. Resolver failures
/// deny: premium content is never served on the strength of an error.
pub async fn can_access<E>(
    State(resolver): State<Arc<EntitlementResolver<E>>>,
    auth: AuthUser,
    Path(content_type): Path<String>,
) -> impl IntoResponse
where
    E: EntitlementRepository + Send + Sync + 'static,
{
    let Some(content_type) = ContentType::from_str(&content_type) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unknown content type: {content_type}"),
        );
    };

    let allowed = match resolver
        .can_access(content_type, auth.user_id, Utc::now())
        .await
    {
        Ok(allowed) => allowed,
        Err(err) => {
            error!(
                user_id = %auth.user_id,
                content_type = %content_type,
                error = ?err,
                "entitlements: resolver failed, denying access"
            );
            false
        }
    };

    (
        StatusCode::OK,
        Json(AccessDecision {
            content_type: content_type.to_string(),
            allowed,
        }),
    )
        .into_response()
}
