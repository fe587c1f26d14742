use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::coupons::CouponEntity;
use crate::domain::repositories::coupons::CouponRepository;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::coupons};

pub struct CouponPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CouponPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CouponRepository for CouponPostgres {
    async fn find_active_by_code(&self, code: &str) -> Result<Option<CouponEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = coupons::table
            .filter(coupons::code.eq(code))
            .filter(coupons::is_active.eq(true))
            .select(CouponEntity::as_select())
            .first::<CouponEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
