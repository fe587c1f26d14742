pub mod coupons;
pub mod entitlements;
pub mod payment_orders;
pub mod plans;
