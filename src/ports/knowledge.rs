//! Knowledge Port - Interface for knowledge base retrieval.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ai::KnowledgeSource;

/// Knowledge retrieval errors.
///
/// Retrieval failure never fails the turn; the orchestrator generates
/// without sources and logs the miss.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge base unavailable: {0}")]
    Unavailable(String),
    #[error("knowledge query timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Port for knowledge base search.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    /// Returns up to `top_k` sources relevant to the query, most relevant
    /// first.
    async fn search(&self, query: &str, top_k: usize)
        -> Result<Vec<KnowledgeSource>, KnowledgeError>;
}
