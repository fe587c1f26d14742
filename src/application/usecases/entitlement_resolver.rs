use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::entities::entitlements::EntitlementEntity;
use crate::domain::repositories::entitlements::EntitlementRepository;
use crate::domain::value_objects::entitlements::EffectiveEntitlement;
use crate::domain::value_objects::enums::content_types::ContentType;

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ResolverError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Computes a user's effective plan level from possibly-overlapping
/// entitlement rows. The single choke point for premium gating; call sites
/// must not re-derive this and must treat an Err as deny.
pub struct EntitlementResolver<E>
where
    E: EntitlementRepository + Send + Sync + 'static,
{
    entitlement_repo: Arc<E>,
    premium_level_threshold: i32,
}

impl<E> EntitlementResolver<E>
where
    E: EntitlementRepository + Send + Sync + 'static,
{
    pub fn new(entitlement_repo: Arc<E>, premium_level_threshold: i32) -> Self {
        Self {
            entitlement_repo,
            premium_level_threshold,
        }
    }

    /// Expiry is evaluated lazily against `now`; nothing sweeps expired rows.
    pub async fn current_entitlement(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<EffectiveEntitlement, ResolverError> {
        let rows = self
            .entitlement_repo
            .list_effective_for_user(user_id, now)
            .await
            .map_err(|err| {
                error!(
                    %user_id,
                    db_error = ?err,
                    "entitlement_resolver: failed to list entitlements"
                );
                ResolverError::Internal(err)
            })?;

        let effective = Self::fold_effective(&rows, self.premium_level_threshold);

        debug!(
            %user_id,
            level = effective.level,
            is_premium = effective.is_premium,
            row_count = rows.len(),
            "entitlement_resolver: resolved effective entitlement"
        );

        Ok(effective)
    }

    pub async fn can_access(
        &self,
        content_type: ContentType,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, ResolverError> {
        match content_type {
            ContentType::Free => Ok(true),
            ContentType::Premium => {
                let effective = self.current_entitlement(user_id, now).await?;
                Ok(effective.is_premium)
            }
        }
    }

    fn fold_effective(rows: &[EntitlementEntity], threshold: i32) -> EffectiveEntitlement {
        let mut level = 0;
        let mut expires_at: Option<DateTime<Utc>> = None;

        for row in rows {
            if row.level > level
                || (row.level == level && Self::outlasts(row.expires_at, expires_at))
            {
                level = row.level;
                expires_at = row.expires_at;
            }
        }

        EffectiveEntitlement {
            level,
            expires_at: if level > 0 { expires_at } else { None },
            is_premium: level >= threshold,
        }
    }

    /// Unlimited (None) beats any bounded expiry at equal level.
    fn outlasts(candidate: Option<DateTime<Utc>>, current: Option<DateTime<Utc>>) -> bool {
        match (candidate, current) {
            (None, Some(_)) => true,
            (Some(candidate), Some(current)) => candidate > current,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::entitlements::MockEntitlementRepository;
    use chrono::Duration;

    const PREMIUM_THRESHOLD: i32 = 2;

    fn sample_entitlement(
        user_id: Uuid,
        level: i32,
        expires_at: Option<DateTime<Utc>>,
    ) -> EntitlementEntity {
        EntitlementEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_id: Uuid::new_v4(),
            level,
            source: "payment".to_string(),
            activated_at: Utc::now() - Duration::days(1),
            expires_at,
            originating_order_id: Some("order_1".to_string()),
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }

    fn resolver_with_rows(
        rows: Vec<EntitlementEntity>,
    ) -> EntitlementResolver<MockEntitlementRepository> {
        let mut entitlement_repo = MockEntitlementRepository::new();
        entitlement_repo
            .expect_list_effective_for_user()
            .returning(move |_, _| {
                let rows = rows.clone();
                Box::pin(async move { Ok(rows) })
            });
        EntitlementResolver::new(Arc::new(entitlement_repo), PREMIUM_THRESHOLD)
    }

    #[tokio::test]
    async fn highest_level_among_live_rows_wins() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        // The repository already filtered out expired rows; the level-1 row
        // here is a live overlap, not an expired one.
        let resolver = resolver_with_rows(vec![
            sample_entitlement(user_id, 1, Some(now + Duration::days(3))),
            sample_entitlement(user_id, 2, Some(now + Duration::days(10))),
        ]);

        let effective = resolver.current_entitlement(user_id, now).await.unwrap();

        assert_eq!(effective.level, 2);
        assert!(effective.is_premium);
        assert_eq!(effective.expires_at, Some(now + Duration::days(10)));
    }

    #[tokio::test]
    async fn expired_rows_are_excluded_by_the_repository_contract() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        // Expiry filtering belongs to the repository: rows with expires_at
        // null or beyond `now` come back, the rest do not. This mock applies
        // that predicate over a stored set holding an expired level-2 row
        // and a live level-1 row.
        let stored = vec![
            sample_entitlement(user_id, 2, Some(now - Duration::days(1))),
            sample_entitlement(user_id, 1, Some(now + Duration::days(30))),
        ];

        let mut entitlement_repo = MockEntitlementRepository::new();
        entitlement_repo
            .expect_list_effective_for_user()
            .returning(move |_, query_now| {
                let live: Vec<EntitlementEntity> = stored
                    .iter()
                    .filter(|row| row.expires_at.is_none_or(|at| at > query_now))
                    .cloned()
                    .collect();
                Box::pin(async move { Ok(live) })
            });
        let resolver = EntitlementResolver::new(Arc::new(entitlement_repo), PREMIUM_THRESHOLD);

        let effective = resolver.current_entitlement(user_id, now).await.unwrap();

        // The lapsed level-2 row no longer counts; only the live level-1
        // row does, which sits below the premium threshold.
        assert_eq!(effective.level, 1);
        assert!(!effective.is_premium);
        assert_eq!(effective.expires_at, Some(now + Duration::days(30)));
    }

    #[tokio::test]
    async fn no_live_entitlement_resolves_to_level_zero() {
        let user_id = Uuid::new_v4();
        let resolver = resolver_with_rows(vec![]);

        let effective = resolver
            .current_entitlement(user_id, Utc::now())
            .await
            .unwrap();

        assert_eq!(
            effective,
            EffectiveEntitlement {
                level: 0,
                expires_at: None,
                is_premium: false,
            }
        );
    }

    #[tokio::test]
    async fn unlimited_expiry_wins_at_equal_level() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let resolver = resolver_with_rows(vec![
            sample_entitlement(user_id, 2, Some(now + Duration::days(5))),
            sample_entitlement(user_id, 2, None),
        ]);

        let effective = resolver.current_entitlement(user_id, now).await.unwrap();

        assert_eq!(effective.level, 2);
        assert_eq!(effective.expires_at, None);
    }

    #[tokio::test]
    async fn free_content_is_always_accessible() {
        let resolver = resolver_with_rows(vec![]);
        let allowed = resolver
            .can_access(ContentType::Free, Uuid::new_v4(), Utc::now())
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn premium_content_is_denied_without_live_entitlement() {
        let resolver = resolver_with_rows(vec![]);
        let allowed = resolver
            .can_access(ContentType::Premium, Uuid::new_v4(), Utc::now())
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn below_threshold_level_is_not_premium() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let resolver =
            resolver_with_rows(vec![sample_entitlement(user_id, 1, Some(now + Duration::days(3)))]);

        let allowed = resolver
            .can_access(ContentType::Premium, user_id, now)
            .await
            .unwrap();

        assert!(!allowed);
    }

    #[tokio::test]
    async fn repository_failure_surfaces_as_error_for_fail_closed_callers() {
        let mut entitlement_repo = MockEntitlementRepository::new();
        entitlement_repo
            .expect_list_effective_for_user()
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));
        let resolver = EntitlementResolver::new(Arc::new(entitlement_repo), PREMIUM_THRESHOLD);

        let result = resolver
            .can_access(ContentType::Premium, Uuid::new_v4(), Utc::now())
            .await;

        assert!(result.is_err());
    }
}
