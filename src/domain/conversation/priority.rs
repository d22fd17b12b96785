//! Conversation priority.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority of a conversation, ordered from lowest to highest.
///
/// The derived `Ord` follows declaration order, so `Low < Medium < High <
/// Critical` and priorities can be compared directly in rule conditions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Returns true for priorities that warrant expedited handling.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::High | Priority::Critical)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}
