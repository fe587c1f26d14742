use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::payment_orders::{InsertPaymentOrderEntity, PaymentOrderEntity};
use crate::domain::value_objects::enums::order_statuses::OrderStatus;

#[async_trait]
#[automock]
pub trait PaymentOrderRepository {
    async fn create(&self, insert_order: InsertPaymentOrderEntity) -> Result<PaymentOrderEntity>;

    async fn find_by_id(&self, order_id: &str) -> Result<Option<PaymentOrderEntity>>;

    /// Single conditional UPDATE guarded by the current status. Returns the
    /// updated row, or None when the order was not in `from` anymore (lost
    /// race or terminal state) — the caller re-reads and acts on what it
    /// finds.
    async fn transition_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<PaymentOrderEntity>>;
}
