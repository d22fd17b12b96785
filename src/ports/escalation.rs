//! Escalation Port - Interface for handing conversations to humans.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::Priority;
use crate::domain::foundation::{ConversationId, TicketId, UserId};

/// Escalation sink errors.
#[derive(Debug, Error)]
pub enum EscalationError {
    #[error("ticketing system unavailable: {0}")]
    Unavailable(String),
    #[error("escalation rejected: {0}")]
    Rejected(String),
}

/// What the human team needs to pick up an escalated conversation.
#[derive(Debug, Clone)]
pub struct EscalationTicket {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub priority: Priority,
    /// Why the conversation was escalated.
    pub reason: String,
    /// Queue chosen by routing rules, if any.
    pub queue: Option<String>,
}

/// Port for creating escalation tickets.
///
/// A sink failure is logged and the ticket retried out of band; the
/// conversation stays escalated either way.
#[async_trait]
pub trait EscalationSink: Send + Sync {
    /// Creates a ticket for the human support team.
    async fn create_ticket(&self, ticket: &EscalationTicket) -> Result<TicketId, EscalationError>;
}
