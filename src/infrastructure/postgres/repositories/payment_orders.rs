use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{insert_into, prelude::*, update};

use crate::domain::entities::payment_orders::{InsertPaymentOrderEntity, PaymentOrderEntity};
use crate::domain::repositories::payment_orders::PaymentOrderRepository;
use crate::domain::value_objects::enums::order_statuses::OrderStatus;
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::payment_orders};

pub struct PaymentOrderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentOrderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentOrderRepository for PaymentOrderPostgres {
    async fn create(&self, insert_order: InsertPaymentOrderEntity) -> Result<PaymentOrderEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = insert_into(payment_orders::table)
            .values(&insert_order)
            .returning(PaymentOrderEntity::as_returning())
            .get_result::<PaymentOrderEntity>(&mut conn)?;

        Ok(result)
    }

    async fn find_by_id(&self, order_id: &str) -> Result<Option<PaymentOrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = payment_orders::table
            .find(order_id)
            .select(PaymentOrderEntity::as_select())
            .first::<PaymentOrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn transition_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<PaymentOrderEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // The status filter makes this a compare-and-set: a concurrent
        // verify that already moved the order out of `from` makes this
        // update match zero rows.
        let result = update(payment_orders::table)
            .filter(payment_orders::id.eq(order_id))
            .filter(payment_orders::status.eq(from.to_string()))
            .set((
                payment_orders::status.eq(to.to_string()),
                payment_orders::updated_at.eq(Utc::now()),
            ))
            .returning(PaymentOrderEntity::as_returning())
            .get_result::<PaymentOrderEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }
}
