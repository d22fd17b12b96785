//! Per-turn AI request/response value objects.

mod request;
mod response;

pub use request::{AiRequest, Attachment, RequestOptions};
pub use response::{
    AiResponse, EscalationRecommendation, FollowUpAction, KnowledgeSource, TokenUsage,
    FALLBACK_LEVEL_TEMPLATE,
};
