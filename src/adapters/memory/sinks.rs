//! Recording escalation and feedback sinks.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::TicketId;
use crate::ports::{EscalationError, EscalationSink, EscalationTicket, FeedbackSink, TurnFeedback};

/// Escalation sink that records tickets in memory.
#[derive(Default)]
pub struct RecordingEscalationSink {
    tickets: Mutex<Vec<EscalationTicket>>,
    failing: AtomicBool,
}

impl RecordingEscalationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, `create_ticket` fails; the conversation must stay
    /// escalated regardless.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Tickets recorded so far.
    pub fn tickets(&self) -> Vec<EscalationTicket> {
        self.tickets.lock().unwrap().clone()
    }
}

#[async_trait]
impl EscalationSink for RecordingEscalationSink {
    async fn create_ticket(&self, ticket: &EscalationTicket) -> Result<TicketId, EscalationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EscalationError::Unavailable("ticketing down".into()));
        }
        self.tickets.lock().unwrap().push(ticket.clone());
        Ok(TicketId::new())
    }
}

/// Feedback sink that records turn feedback in memory.
#[derive(Default)]
pub struct RecordingFeedbackSink {
    records: Mutex<Vec<TurnFeedback>>,
}

impl RecordingFeedbackSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feedback recorded so far.
    pub fn records(&self) -> Vec<TurnFeedback> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackSink for RecordingFeedbackSink {
    async fn record(&self, feedback: TurnFeedback) {
        self.records.lock().unwrap().push(feedback);
    }
}
