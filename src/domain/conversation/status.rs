//! Conversation lifecycle state machine.
//!
//! Defines the lifecycle states of a conversation and valid transitions.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// The lifecycle status of a conversation.
///
/// Conversations move through these states from creation to completion:
/// - `Active`: Idle, awaiting user input
/// - `Waiting`: Sub-state of `Active` used when the agent is blocked on
///   missing information; identical transition rules, reported separately
///   for analytics
/// - `Processing`: A turn is currently being handled
/// - `Resolved`: Terminal, resolved automatically or confirmed by the user
/// - `Escalated`: Terminal for the agent, ownership transferred to a human
/// - `Abandoned`: Terminal, closed by the inactivity timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Awaiting user input.
    #[default]
    Active,

    /// Awaiting specific information the agent asked for.
    Waiting,

    /// A turn is in flight.
    Processing,

    /// Resolved without human involvement (or confirmed resolved).
    Resolved,

    /// Handed over to a human queue.
    Escalated,

    /// Closed after the inactivity timeout.
    Abandoned,
}

impl ConversationStatus {
    /// Returns true if the conversation can accept a new inbound message.
    ///
    /// A message arriving on a terminal conversation opens a new one instead.
    pub fn accepts_messages(&self) -> bool {
        matches!(self, Self::Active | Self::Waiting)
    }

    /// Returns true while the conversation has not reached a terminal state.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Resolved | Self::Escalated | Self::Abandoned)
    }

    /// Returns true for the idle family of states (`Active` plus its
    /// `Waiting` sub-state).
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Active | Self::Waiting)
    }
}

impl StateMachine for ConversationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationStatus::*;
        matches!(
            (self, target),
            // A turn may start whenever the conversation is idle
            (Active, Processing) |
            (Waiting, Processing) |
            // Turn resolved, conversation continues (or needs information)
            (Processing, Active) |
            (Processing, Waiting) |
            // Turn outcome closes the conversation
            (Processing, Resolved) |
            (Processing, Escalated) |
            // Idle conversations may time out or be closed directly
            (Active, Abandoned) |
            (Waiting, Abandoned) |
            (Active, Resolved) |
            (Waiting, Resolved) |
            (Active, Escalated) |
            (Waiting, Escalated) |
            // Waiting is a reporting sub-state of Active
            (Active, Waiting) |
            (Waiting, Active)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationStatus::*;
        match self {
            Active => vec![Waiting, Processing, Resolved, Escalated, Abandoned],
            Waiting => vec![Active, Processing, Resolved, Escalated, Abandoned],
            Processing => vec![Active, Waiting, Resolved, Escalated],
            Resolved | Escalated | Abandoned => vec![],
        }
    }
}
