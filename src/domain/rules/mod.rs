//! Configurable business rules: condition trees, rule sets, and the engine
//! that evaluates them per turn.

mod condition;
mod engine;
mod rule;

pub use condition::{ComparisonOp, Condition, ConditionError};
pub use engine::{RuleConfigError, RuleDecision, RuleSet, RulesEngine};
pub use rule::{Action, Rule, RuleType};
