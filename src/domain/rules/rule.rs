//! Business rule definitions.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::RuleId;

use super::condition::Condition;

/// Category a rule belongs to; evaluation can be filtered per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Escalation,
    Routing,
    Automation,
    Sla,
}

/// Action fired when a rule matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Action {
    /// Escalate the conversation to a human.
    Escalate { reason: String },
    /// Route the conversation to a named queue or team.
    Route { queue: String },
    /// Apply a response-time commitment.
    SetSla { minutes: u32 },
    /// Notify an external target (webhook name, channel, on-call rota).
    Notify { target: String },
    /// Attach a label to the conversation.
    Tag { label: String },
    /// Resolve the conversation without a human touching it.
    AutoResolve,
}

fn default_enabled() -> bool {
    true
}

/// A single business rule loaded from configuration.
///
/// Higher `priority` evaluates first. Rules never mutate after load; the
/// engine swaps whole rule sets instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Higher wins ties in decision conflicts.
    pub priority: i32,
    pub condition: Condition,
    pub actions: Vec<Action>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}
