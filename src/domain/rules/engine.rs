//! Rule set loading and evaluation.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::foundation::RuleId;

use super::condition::{ConditionError, RegexCache};
use super::rule::{Action, Rule, RuleType};

/// Problems that make a rule set unloadable.
///
/// A set that fails any of these checks is refused whole; the engine keeps
/// serving the previously loaded set.
#[derive(Debug, Error)]
pub enum RuleConfigError {
    #[error("rule set is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate rule id {0:?}")]
    DuplicateId(String),
    #[error("rule id must not be empty")]
    EmptyRuleId,
    #[error("rule {rule_id:?} has no actions")]
    NoActions { rule_id: String },
    #[error("rule {rule_id:?} has an invalid condition: {source}")]
    InvalidCondition {
        rule_id: String,
        source: ConditionError,
    },
}

/// An immutable, validated set of rules sorted by descending priority.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
    regexes: RegexCache,
}

impl RuleSet {
    /// Parses and validates a rule set from a JSON array of rules.
    pub fn from_json(json: &str) -> Result<Self, RuleConfigError> {
        let rules: Vec<Rule> = serde_json::from_str(json)?;
        Self::from_rules(rules)
    }

    /// Validates rules built in code: unique non-empty ids, non-empty
    /// action lists, and well-formed conditions (regexes compile here).
    pub fn from_rules(mut rules: Vec<Rule>) -> Result<Self, RuleConfigError> {
        let mut seen = HashSet::new();
        let mut regexes = RegexCache::default();
        for rule in &rules {
            if rule.id.as_str().trim().is_empty() {
                return Err(RuleConfigError::EmptyRuleId);
            }
            if !seen.insert(rule.id.as_str().to_string()) {
                return Err(RuleConfigError::DuplicateId(rule.id.as_str().to_string()));
            }
            if rule.actions.is_empty() {
                return Err(RuleConfigError::NoActions {
                    rule_id: rule.id.as_str().to_string(),
                });
            }
            rule.condition
                .validate(&mut regexes)
                .map_err(|source| RuleConfigError::InvalidCondition {
                    rule_id: rule.id.as_str().to_string(),
                    source,
                })?;
        }
        // Stable sort keeps load order for equal priorities.
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(Self { rules, regexes })
    }

    /// Empty rule set; every evaluation returns no matches.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            regexes: RegexCache::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Outcome of evaluating a rule set against one turn's context.
///
/// All matched rules fire their actions; where actions conflict (escalation
/// reason, routing queue, SLA), the highest-priority match wins and the rest
/// are ignored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleDecision {
    /// Ids of every rule that matched, in evaluation order.
    pub matched: Vec<RuleId>,
    /// Escalation reason from the highest-priority matching escalate action.
    pub escalate: Option<String>,
    /// Queue from the highest-priority matching route action.
    pub route: Option<String>,
    /// SLA minutes from the highest-priority matching set_sla action.
    pub sla_minutes: Option<u32>,
    /// True if any matched rule asked for auto-resolution.
    pub auto_resolve: bool,
    /// Labels from every matched tag action.
    pub tags: Vec<String>,
    /// Targets from every matched notify action.
    pub notifications: Vec<String>,
}

impl RuleDecision {
    pub fn any_matched(&self) -> bool {
        !self.matched.is_empty()
    }
}

/// Evaluates business rules against turn contexts.
///
/// The active rule set lives behind an `Arc` swapped atomically on reload,
/// so in-flight evaluations finish against the set they started with.
#[derive(Debug)]
pub struct RulesEngine {
    current: RwLock<Arc<RuleSet>>,
}

impl RulesEngine {
    /// Creates an engine serving the given rule set.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(rules)),
        }
    }

    /// Replaces the active rule set. The new set was already validated by
    /// [`RuleSet::from_rules`], so a reload can only swap in a good set.
    pub fn reload(&self, rules: RuleSet) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(rules);
    }

    /// Snapshot of the active rule set.
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Evaluates enabled rules (optionally of one category) against a
    /// context, highest priority first.
    pub fn evaluate(&self, context: &Value, filter: Option<RuleType>) -> RuleDecision {
        let set = self.snapshot();
        let mut decision = RuleDecision::default();

        for rule in &set.rules {
            if !rule.enabled {
                continue;
            }
            if filter.is_some_and(|f| rule.rule_type != f) {
                continue;
            }
            if !rule.condition.evaluate(context, &set.regexes) {
                continue;
            }
            debug!(rule_id = %rule.id, priority = rule.priority, "rule matched");
            decision.matched.push(rule.id.clone());
            for action in &rule.actions {
                match action {
                    Action::Escalate { reason } => {
                        if decision.escalate.is_none() {
                            decision.escalate = Some(reason.clone());
                        }
                    }
                    Action::Route { queue } => {
                        if decision.route.is_none() {
                            decision.route = Some(queue.clone());
                        }
                    }
                    Action::SetSla { minutes } => {
                        if decision.sla_minutes.is_none() {
                            decision.sla_minutes = Some(*minutes);
                        }
                    }
                    Action::Notify { target } => decision.notifications.push(target.clone()),
                    Action::Tag { label } => decision.tags.push(label.clone()),
                    Action::AutoResolve => decision.auto_resolve = true,
                }
            }
        }
        decision
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new(RuleSet::empty())
    }
}
