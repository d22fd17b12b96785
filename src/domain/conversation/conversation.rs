//! Conversation aggregate - authoritative lifecycle owner.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Channel, ConversationStatus, Priority};
use crate::domain::foundation::{
    ConversationId, DomainError, ErrorCode, StateMachine, Timestamp, UserId, ValidationError,
};

/// Running counters maintained across turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ConversationCounters {
    /// Total messages recorded (user + agent + system).
    pub messages: u32,
    /// Completed turns.
    pub turns: u32,
    /// Running average of per-turn overall confidence.
    pub avg_confidence: f64,
    /// Running average of per-turn sentiment score.
    pub avg_sentiment: f64,
}

impl ConversationCounters {
    /// Records one message.
    fn record_message(&mut self) {
        self.messages += 1;
    }

    /// Folds a completed turn's signals into the running averages.
    fn record_turn(&mut self, confidence: f64, sentiment: f64) {
        self.turns += 1;
        let n = f64::from(self.turns);
        self.avg_confidence += (confidence - self.avg_confidence) / n;
        self.avg_sentiment += (sentiment - self.avg_sentiment) / n;
    }
}

/// Outcome of a processed turn, decided by the rules engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Turn answered; conversation stays open.
    Continue,
    /// Agent asked for missing information; conversation waits on the user.
    AwaitInformation,
    /// Conversation resolved automatically.
    Resolve,
    /// Conversation handed to a human queue.
    Escalate { reason: String },
}

/// Bounded satisfaction score (1-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SatisfactionScore(u8);

impl SatisfactionScore {
    /// Creates a score, rejecting values outside 1..=5.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if !(1..=5).contains(&value) {
            return Err(ValidationError::out_of_range(
                "satisfaction",
                1,
                5,
                i32::from(value),
            ));
        }
        Ok(Self(value))
    }

    /// Returns the raw value.
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Conversation aggregate.
///
/// Owns the lifecycle status and enforces legal transitions. A user holds at
/// most one open conversation per channel; that uniqueness is enforced by
/// the conversation service on creation. Terminal conversations are archived,
/// never deleted - a new message on one opens a fresh conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    user_id: UserId,
    channel: Channel,
    status: ConversationStatus,
    priority: Priority,
    counters: ConversationCounters,
    escalation_reason: Option<String>,
    satisfaction: Option<SatisfactionScore>,
    created_at: Timestamp,
    last_activity_at: Timestamp,
    ended_at: Option<Timestamp>,
}

impl Conversation {
    /// Creates a new active conversation.
    pub fn new(user_id: UserId, channel: Channel) -> Self {
        let now = Timestamp::now();
        Self {
            id: ConversationId::new(),
            user_id,
            channel,
            status: ConversationStatus::Active,
            priority: Priority::default(),
            counters: ConversationCounters::default(),
            escalation_reason: None,
            satisfaction: None,
            created_at: now,
            last_activity_at: now,
            ended_at: None,
        }
    }

    /// Creates a conversation with an explicit priority.
    pub fn with_priority(user_id: UserId, channel: Channel, priority: Priority) -> Self {
        let mut conversation = Self::new(user_id, channel);
        conversation.priority = priority;
        conversation
    }

    // === Accessors ===

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn counters(&self) -> &ConversationCounters {
        &self.counters
    }

    pub fn escalation_reason(&self) -> Option<&str> {
        self.escalation_reason.as_deref()
    }

    pub fn is_escalated(&self) -> bool {
        self.status == ConversationStatus::Escalated
    }

    pub fn satisfaction(&self) -> Option<SatisfactionScore> {
        self.satisfaction
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_activity_at(&self) -> Timestamp {
        self.last_activity_at
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    /// Returns true while the conversation has not reached a terminal state.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    // === Lifecycle ===

    /// Enters `Processing` for a new turn.
    ///
    /// Legal only from the idle states; a terminal conversation reports
    /// `ConversationTerminal` so the caller opens a new one instead.
    pub fn begin_processing(&mut self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::ConversationTerminal,
                format!("Conversation {} is {:?}", self.id, self.status),
            ));
        }
        if self.status == ConversationStatus::Processing {
            return Err(DomainError::new(
                ErrorCode::ConversationBusy,
                format!("Conversation {} already has a turn in flight", self.id),
            ));
        }
        self.transition(ConversationStatus::Processing)?;
        self.touch(Timestamp::now());
        Ok(())
    }

    /// Completes the in-flight turn with the decided outcome.
    pub fn complete_turn(&mut self, outcome: TurnOutcome) -> Result<(), DomainError> {
        if self.status != ConversationStatus::Processing {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("No turn in flight on conversation {}", self.id),
            ));
        }
        match outcome {
            TurnOutcome::Continue => self.transition(ConversationStatus::Active),
            TurnOutcome::AwaitInformation => self.transition(ConversationStatus::Waiting),
            TurnOutcome::Resolve => {
                self.transition(ConversationStatus::Resolved)?;
                self.ended_at = Some(Timestamp::now());
                Ok(())
            }
            TurnOutcome::Escalate { reason } => {
                self.transition(ConversationStatus::Escalated)?;
                self.escalation_reason = Some(reason);
                self.ended_at = Some(Timestamp::now());
                Ok(())
            }
        }
    }

    /// Forced rollback after a mid-turn failure.
    ///
    /// Always returns the conversation to `Active` (never to a terminal
    /// state) so the user can retry the same turn. No-op if no turn is in
    /// flight.
    pub fn rollback_processing(&mut self) {
        if self.status == ConversationStatus::Processing {
            self.status = ConversationStatus::Active;
        }
    }

    /// Closes the conversation as resolved from an idle state (e.g. explicit
    /// user confirmation outside a turn).
    pub fn resolve(&mut self) -> Result<(), DomainError> {
        self.transition(ConversationStatus::Resolved)?;
        self.ended_at = Some(Timestamp::now());
        Ok(())
    }

    /// Escalates the conversation from an idle state.
    pub fn escalate(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        self.transition(ConversationStatus::Escalated)?;
        self.escalation_reason = Some(reason.into());
        self.ended_at = Some(Timestamp::now());
        Ok(())
    }

    /// Checks the inactivity timeout and abandons the conversation if idle
    /// for at least `threshold`.
    ///
    /// Driven by an external scheduler; the aggregate runs no timers itself.
    /// Returns true if the conversation transitioned to `Abandoned`.
    pub fn check_timeout(&mut self, now: Timestamp, threshold: Duration) -> bool {
        if !self.status.is_idle() {
            return false;
        }
        if now.duration_since(&self.last_activity_at) < threshold {
            return false;
        }
        // Idle states always permit Abandoned; unwrap-free via direct check.
        if self.transition(ConversationStatus::Abandoned).is_ok() {
            self.ended_at = Some(now);
            true
        } else {
            false
        }
    }

    /// Records the user's satisfaction score after resolution.
    pub fn record_satisfaction(&mut self, value: u8) -> Result<(), DomainError> {
        if self.status != ConversationStatus::Resolved {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Satisfaction can only be recorded on resolved conversations",
            ));
        }
        self.satisfaction = Some(SatisfactionScore::new(value)?);
        Ok(())
    }

    // === Bookkeeping ===

    /// Records a stored message against the counters.
    pub fn record_message(&mut self) {
        self.counters.record_message();
        self.touch(Timestamp::now());
    }

    /// Folds a completed turn's confidence and sentiment into the running
    /// averages, for rule evaluation on later turns.
    pub fn record_turn_signals(&mut self, confidence: f64, sentiment: f64) {
        self.counters.record_turn(confidence, sentiment);
    }

    /// Raises priority; never lowers it (rules only escalate urgency).
    pub fn raise_priority(&mut self, priority: Priority) {
        if priority > self.priority {
            self.priority = priority;
        }
    }

    /// Advances `last_activity_at`, keeping it monotonically non-decreasing.
    pub fn touch(&mut self, now: Timestamp) {
        if now.is_after(&self.last_activity_at) {
            self.last_activity_at = now;
        }
    }

    /// Snapshot of conversation fields for the rule evaluation context.
    pub fn rule_context(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.to_string(),
            "channel": self.channel,
            "status": self.status,
            "priority": self.priority,
            "message_count": self.counters.messages,
            "turns": self.counters.turns,
            "avg_confidence": self.counters.avg_confidence,
            "avg_sentiment": self.counters.avg_sentiment,
            "escalated": self.is_escalated(),
        })
    }

    fn transition(&mut self, target: ConversationStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|err| {
            DomainError::new(ErrorCode::InvalidStateTransition, err.to_string())
        })?;
        Ok(())
    }
}
