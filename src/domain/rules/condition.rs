//! Rule condition trees and their evaluation.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Comparison operator of a leaf condition.
///
/// Deserialized as a closed enum: a rule file naming an operator this
/// version does not know fails to parse, so the whole set is refused at
/// load instead of silently never matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    In,
    Matches,
}

/// A condition tree: nested all/any/not groups over leaf comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// Every child must match.
    All { all: Vec<Condition> },
    /// At least one child must match.
    Any { any: Vec<Condition> },
    /// Child must not match.
    Not { not: Box<Condition> },
    /// Leaf comparison against a dotted path into the evaluation context.
    Compare {
        field: String,
        op: ComparisonOp,
        value: Value,
    },
}

/// Structural problems found while validating a condition tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConditionError {
    #[error("empty condition group")]
    EmptyGroup,
    #[error("invalid regex pattern {pattern:?}: {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("operator {op:?} requires an array value")]
    NonArrayInValue { op: String },
}

/// Regexes compiled once at rule-set load, keyed by pattern.
#[derive(Debug, Default)]
pub struct RegexCache {
    compiled: HashMap<String, Regex>,
}

impl RegexCache {
    fn get(&self, pattern: &str) -> Option<&Regex> {
        self.compiled.get(pattern)
    }
}

impl Condition {
    /// Convenience constructor for a leaf comparison.
    pub fn compare(field: impl Into<String>, op: ComparisonOp, value: Value) -> Self {
        Condition::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// Validates the tree and compiles any `matches` patterns into `cache`.
    ///
    /// Empty `all`/`any` groups are rejected rather than given a vacuous
    /// truth value, and a `matches` leaf whose value is not a valid regex
    /// string is rejected here so evaluation can never hit a bad pattern.
    pub fn validate(&self, cache: &mut RegexCache) -> Result<(), ConditionError> {
        match self {
            Condition::All { all } | Condition::Any { any: all } => {
                if all.is_empty() {
                    return Err(ConditionError::EmptyGroup);
                }
                for child in all {
                    child.validate(cache)?;
                }
                Ok(())
            }
            Condition::Not { not } => not.validate(cache),
            Condition::Compare { op, value, .. } => match op {
                ComparisonOp::Matches => {
                    let pattern = value.as_str().ok_or_else(|| ConditionError::InvalidRegex {
                        pattern: value.to_string(),
                        message: "pattern must be a string".to_string(),
                    })?;
                    if !cache.compiled.contains_key(pattern) {
                        let regex =
                            Regex::new(pattern).map_err(|e| ConditionError::InvalidRegex {
                                pattern: pattern.to_string(),
                                message: e.to_string(),
                            })?;
                        cache.compiled.insert(pattern.to_string(), regex);
                    }
                    Ok(())
                }
                ComparisonOp::In => {
                    if value.is_array() {
                        Ok(())
                    } else {
                        Err(ConditionError::NonArrayInValue {
                            op: "in".to_string(),
                        })
                    }
                }
                _ => Ok(()),
            },
        }
    }

    /// Evaluates the tree against a JSON evaluation context.
    ///
    /// An absent (or null) field makes every comparison false, except
    /// `not_equals` against a non-null value, which is true: "field differs
    /// from X" holds when the field is missing.
    pub fn evaluate(&self, context: &Value, cache: &RegexCache) -> bool {
        match self {
            Condition::All { all } => all.iter().all(|c| c.evaluate(context, cache)),
            Condition::Any { any } => any.iter().any(|c| c.evaluate(context, cache)),
            Condition::Not { not } => !not.evaluate(context, cache),
            Condition::Compare { field, op, value } => {
                let actual = lookup(context, field).filter(|v| !v.is_null());
                match op {
                    ComparisonOp::Equals => actual.is_some_and(|a| json_eq(a, value)),
                    ComparisonOp::NotEquals => match actual {
                        Some(a) => !json_eq(a, value),
                        None => !value.is_null(),
                    },
                    ComparisonOp::GreaterThan => compare_numeric(actual, value, |a, b| a > b),
                    ComparisonOp::LessThan => compare_numeric(actual, value, |a, b| a < b),
                    ComparisonOp::Contains => actual.is_some_and(|a| contains(a, value)),
                    ComparisonOp::In => actual.is_some_and(|a| {
                        value
                            .as_array()
                            .is_some_and(|arr| arr.iter().any(|v| json_eq(a, v)))
                    }),
                    ComparisonOp::Matches => actual.is_some_and(|a| {
                        let (Some(text), Some(pattern)) = (a.as_str(), value.as_str()) else {
                            return false;
                        };
                        cache.get(pattern).is_some_and(|re| re.is_match(text))
                    }),
                }
            }
        }
    }
}

/// Walks a dotted path ("conversation.priority") into a JSON object tree.
fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = context;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// JSON equality with numeric coercion, so `5` and `5.0` compare equal.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare_numeric(actual: Option<&Value>, expected: &Value, cmp: fn(f64, f64) -> bool) -> bool {
    match (actual.and_then(Value::as_f64), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// `contains` over strings (substring) and arrays (membership).
fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(s) => expected.as_str().is_some_and(|needle| s.contains(needle)),
        Value::Array(items) => items.iter().any(|item| json_eq(item, expected)),
        _ => false,
    }
}
