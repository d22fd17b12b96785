//! Feedback Port - Fire-and-forget turn telemetry for model improvement.

use async_trait::async_trait;

use crate::domain::foundation::ConversationId;

/// One turn's outcome signals, emitted after the response is sent.
#[derive(Debug, Clone)]
pub struct TurnFeedback {
    pub conversation_id: ConversationId,
    pub intent: String,
    pub confidence: f64,
    pub fallback_level: u8,
    pub escalated: bool,
    pub processing_ms: u64,
}

/// Port for recording turn feedback.
///
/// Best effort: the orchestrator spawns the call and never waits on it, so
/// implementations swallow their own failures.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Records one turn's feedback.
    async fn record(&self, feedback: TurnFeedback);
}
