use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::payment_orders;

/// Local record of a gateway order. The id is gateway-issued, which is why
/// the row is inserted only after the gateway call succeeds.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_orders)]
pub struct PaymentOrderEntity {
    pub id: String,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub coupon_code: Option<String>,
    pub amount_minor: i32,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payment_orders)]
pub struct InsertPaymentOrderEntity {
    pub id: String,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub coupon_code: Option<String>,
    pub amount_minor: i32,
    pub currency: String,
    pub status: String,
}
