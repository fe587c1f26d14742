pub mod activation;
pub mod checkout;
pub mod coupons;
pub mod entitlement_resolver;
pub mod pricing;
pub mod verification;
