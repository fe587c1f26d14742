pub mod content_types;
pub mod entitlement_sources;
pub mod order_statuses;
