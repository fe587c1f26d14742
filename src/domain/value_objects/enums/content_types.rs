use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Content classes recognized by the gating choke point. Anything the
/// router cannot parse into one of these is rejected before resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentType {
    Free,
    Premium,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Free => "free",
            ContentType::Premium => "premium",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "free" => Some(ContentType::Free),
            "premium" => Some(ContentType::Premium),
            _ => None,
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
