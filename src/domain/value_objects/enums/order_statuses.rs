use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Terminal once Verified or Failed; the transition out of Created is a
/// single conditional update in the repository.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Created,
    Verified,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Verified => "verified",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "created" => Some(OrderStatus::Created),
            "verified" => Some(OrderStatus::Verified),
            "failed" => Some(OrderStatus::Failed),
            _ => None,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
