//! Analysis signal types.
//!
//! Value objects for the per-message analysis signals produced by the
//! external classification collaborators: intent, entities, sentiment, and
//! emotion. Each type has an explicit "unknown"/neutral form used when the
//! producing analysis task failed or timed out (partial-analysis
//! degradation).

use serde::{Deserialize, Serialize};

/// Label used for any signal whose producing analysis task failed.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Classified intent of a user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Primary intent label (e.g. "billing_question", "cancel_account").
    pub label: String,
    /// Classifier confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Lower-ranked candidate intents, most likely first.
    pub secondary: Vec<SecondaryIntent>,
}

/// A lower-ranked intent candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryIntent {
    pub label: String,
    pub confidence: f64,
}

impl Intent {
    /// Creates an intent with no secondary candidates.
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
            secondary: Vec::new(),
        }
    }

    /// Degraded intent used when classification failed.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_LABEL, 0.0)
    }

    /// Returns true if this is the degraded unknown intent.
    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }

    /// Rough complexity signal used for provider routing: intents with many
    /// plausible candidates or low confidence are harder to answer.
    pub fn complexity(&self) -> IntentComplexity {
        if self.is_unknown() || self.confidence < 0.5 || self.secondary.len() > 2 {
            IntentComplexity::High
        } else if self.confidence < 0.8 || !self.secondary.is_empty() {
            IntentComplexity::Medium
        } else {
            IntentComplexity::Low
        }
    }
}

/// Coarse complexity bucket for an intent, used by provider routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentComplexity {
    Low,
    Medium,
    High,
}

/// An entity extracted from a user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity kind (e.g. "order_id", "product", "date").
    pub kind: String,
    /// Surface value as extracted from the text.
    pub value: String,
    /// Extractor confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

impl Entity {
    /// Creates a new entity.
    pub fn new(kind: impl Into<String>, value: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            confidence,
        }
    }
}

/// Sentiment score in `[-1.0, 1.0]`, clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentiment(f64);

impl Sentiment {
    /// Creates a sentiment score, clamping into `[-1.0, 1.0]`.
    pub fn new(score: f64) -> Self {
        Self(score.clamp(-1.0, 1.0))
    }

    /// Neutral sentiment, also the degraded value when analysis failed.
    pub fn neutral() -> Self {
        Self(0.0)
    }

    /// Returns the raw score.
    pub fn score(&self) -> f64 {
        self.0
    }

    /// Returns true for clearly negative sentiment.
    pub fn is_negative(&self) -> bool {
        self.0 < -0.3
    }
}

impl Default for Sentiment {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Detected emotion with intensity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    /// Emotion label (e.g. "frustration", "anger", "satisfaction").
    pub label: String,
    /// Intensity in `[0.0, 1.0]`, clamped on construction.
    pub intensity: f64,
}

impl Emotion {
    /// Creates an emotion, clamping intensity into `[0.0, 1.0]`.
    pub fn new(label: impl Into<String>, intensity: f64) -> Self {
        Self {
            label: label.into(),
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    /// Degraded emotion used when detection failed.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_LABEL, 0.0)
    }

    /// Returns true for high-intensity distress emotions that should steer
    /// generation toward de-escalation.
    pub fn needs_deescalation(&self) -> bool {
        self.intensity >= 0.7
            && matches!(self.label.as_str(), "anger" | "frustration" | "distress" | "fear")
    }
}

/// The independent analysis tasks run per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisTask {
    Intent,
    Entities,
    Sentiment,
    Emotion,
}

/// Policy trigger derived from analysis signals.
///
/// A policy trigger forces an escalation recommendation regardless of
/// confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyTrigger {
    /// Message indicates self-harm risk.
    SelfHarm,
    /// User explicitly asked for a human agent.
    HumanRequested,
}

impl PolicyTrigger {
    /// Maps an intent label to a policy trigger, if any.
    pub fn from_intent_label(label: &str) -> Option<Self> {
        match label {
            "self_harm" => Some(PolicyTrigger::SelfHarm),
            "human_handoff" | "speak_to_agent" => Some(PolicyTrigger::HumanRequested),
            _ => None,
        }
    }

    /// Human-readable escalation reason.
    pub fn reason(&self) -> &'static str {
        match self {
            PolicyTrigger::SelfHarm => "policy: self-harm risk detected",
            PolicyTrigger::HumanRequested => "policy: user requested a human agent",
        }
    }
}
