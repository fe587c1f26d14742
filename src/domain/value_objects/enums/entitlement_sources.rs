use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntitlementSource {
    Payment,
    FreeCoupon,
}

impl EntitlementSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementSource::Payment => "payment",
            EntitlementSource::FreeCoupon => "free_coupon",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "payment" => Some(EntitlementSource::Payment),
            "free_coupon" => Some(EntitlementSource::FreeCoupon),
            _ => None,
        }
    }
}

impl Display for EntitlementSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
