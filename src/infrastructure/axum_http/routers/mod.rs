pub mod billing;
pub mod entitlements;
