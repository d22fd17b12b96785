//! Canned knowledge retriever.

use async_trait::async_trait;

use crate::domain::ai::KnowledgeSource;
use crate::ports::{KnowledgeError, KnowledgeRetriever};

/// Keyword-indexed knowledge base for tests and demos.
#[derive(Default)]
pub struct CannedKnowledgeRetriever {
    articles: Vec<(String, KnowledgeSource)>,
    failing: bool,
}

impl CannedKnowledgeRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `source` under `keyword`.
    pub fn with_article(mut self, keyword: impl Into<String>, source: KnowledgeSource) -> Self {
        self.articles.push((keyword.into(), source));
        self
    }

    /// Creates a retriever that always errors.
    pub fn failing() -> Self {
        Self {
            articles: Vec::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl KnowledgeRetriever for CannedKnowledgeRetriever {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<KnowledgeSource>, KnowledgeError> {
        if self.failing {
            return Err(KnowledgeError::Unavailable("knowledge base down".into()));
        }
        let lowered = query.to_lowercase();
        let mut hits: Vec<KnowledgeSource> = self
            .articles
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(_, source)| source.clone())
            .collect();
        hits.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        hits.truncate(top_k);
        Ok(hits)
    }
}
