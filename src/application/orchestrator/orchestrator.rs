//! Per-turn AI orchestration.
//!
//! One `process` call runs the whole pipeline for a turn: concurrent
//! analysis, knowledge retrieval, provider routing, the generation fallback
//! chain, and the escalation recommendation. The call never fails; every
//! stage degrades instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{info, warn};

use crate::config::OrchestratorConfig;
use crate::domain::ai::{
    AiRequest, AiResponse, EscalationRecommendation, FollowUpAction, KnowledgeSource,
};
use crate::domain::analysis::PolicyTrigger;
use crate::domain::conversation::MessageAnalysis;
use crate::ports::{FeedbackSink, GenerationRequest, KnowledgeRetriever, TurnFeedback};

use super::analysis::AnalysisPipeline;
use super::chain::FallbackChain;
use super::router::ProviderRouter;

/// Orchestrates the per-turn AI pipeline.
pub struct AiOrchestrator {
    analysis: AnalysisPipeline,
    knowledge: Arc<dyn KnowledgeRetriever>,
    router: ProviderRouter,
    chain: FallbackChain,
    feedback: Arc<dyn FeedbackSink>,
    config: OrchestratorConfig,
}

impl AiOrchestrator {
    /// Creates an orchestrator from its pipeline stages.
    pub fn new(
        analysis: AnalysisPipeline,
        knowledge: Arc<dyn KnowledgeRetriever>,
        router: ProviderRouter,
        feedback: Arc<dyn FeedbackSink>,
        config: OrchestratorConfig,
    ) -> Self {
        let chain = FallbackChain::new(config.provider_timeout(), config.max_response_chars);
        Self {
            analysis,
            knowledge,
            router,
            chain,
            feedback,
            config,
        }
    }

    /// Processes one turn. Infallible: analysis degrades per signal, an
    /// exhausted provider chain degrades to a template, and the turn
    /// deadline cuts the chain short rather than erroring.
    pub async fn process(&self, request: &AiRequest) -> AiResponse {
        let started = Instant::now();
        let deadline = started + self.config.turn_deadline();

        let analysis = self.analysis.analyze(&request.message).await;
        let knowledge = self.retrieve_knowledge(request).await;

        let order = self.router.order_for(&analysis.intent, &analysis.emotion);
        let generation = GenerationRequest {
            message: request.message.clone(),
            topic: request.active_topic.clone(),
            intent: analysis.intent.clone(),
            emotion: analysis.emotion.clone(),
            knowledge: knowledge.clone(),
            options: self.router.options_for(&analysis.emotion),
        };
        let outcome = self.chain.generate(&order, &generation, deadline).await;

        // One weak signal must not be masked by a strong one.
        let confidence = analysis.intent.confidence.min(outcome.confidence);
        let threshold = request
            .options
            .confidence_threshold
            .unwrap_or(self.config.confidence_threshold);
        let escalation = self.recommend_escalation(&analysis, &outcome.provider, confidence, threshold);
        let follow_ups = suggest_follow_ups(&analysis, &knowledge, confidence, threshold);

        let processing_ms = started.elapsed().as_millis() as u64;
        let response = AiResponse {
            text: outcome.text,
            confidence,
            intent: analysis.intent,
            entities: analysis.entities,
            sentiment: analysis.sentiment,
            emotion: analysis.emotion,
            knowledge_sources: knowledge,
            follow_ups,
            escalation,
            model_used: outcome.model,
            fallback_level: outcome.fallback_level,
            processing_ms,
            tokens: outcome.tokens,
            degraded_analysis: analysis.degraded,
        };

        info!(
            conversation_id = %request.conversation_id,
            intent = %response.intent.label,
            confidence = response.confidence,
            fallback_level = response.fallback_level,
            processing_ms,
            "turn processed"
        );
        self.emit_feedback(request, &response);
        response
    }

    /// Rebuilds the stored per-message analysis from a response.
    pub fn analysis_of(response: &AiResponse) -> MessageAnalysis {
        MessageAnalysis {
            intent: response.intent.clone(),
            entities: response.entities.clone(),
            sentiment: response.sentiment,
            emotion: response.emotion.clone(),
            degraded: response.degraded_analysis.clone(),
        }
    }

    async fn retrieve_knowledge(&self, request: &AiRequest) -> Vec<KnowledgeSource> {
        let top_k = request
            .options
            .knowledge_top_k
            .unwrap_or(self.config.knowledge_top_k);
        let budget: Duration = self.config.analysis_timeout();
        match timeout(budget, self.knowledge.search(&request.message, top_k)).await {
            Ok(Ok(sources)) => sources,
            Ok(Err(err)) => {
                warn!(error = %err, "knowledge retrieval failed, answering without sources");
                Vec::new()
            }
            Err(_) => {
                warn!("knowledge retrieval timed out, answering without sources");
                Vec::new()
            }
        }
    }

    /// Escalation recommendation, advisory to the rules engine.
    ///
    /// Policy triggers outrank everything; the template path and low overall
    /// confidence also recommend escalation.
    fn recommend_escalation(
        &self,
        analysis: &MessageAnalysis,
        provider: &str,
        confidence: f64,
        threshold: f64,
    ) -> EscalationRecommendation {
        if let Some(trigger) = PolicyTrigger::from_intent_label(&analysis.intent.label) {
            return EscalationRecommendation::because(trigger.reason());
        }
        if provider == super::chain::TEMPLATE_MODEL {
            return EscalationRecommendation::because("no generation provider could answer");
        }
        if confidence < threshold {
            return EscalationRecommendation::because(format!(
                "overall confidence {confidence:.2} below threshold {threshold:.2}"
            ));
        }
        EscalationRecommendation::none()
    }

    /// Emits turn feedback without waiting on the sink.
    fn emit_feedback(&self, request: &AiRequest, response: &AiResponse) {
        let sink = Arc::clone(&self.feedback);
        let feedback = TurnFeedback {
            conversation_id: request.conversation_id,
            intent: response.intent.label.clone(),
            confidence: response.confidence,
            fallback_level: response.fallback_level,
            escalated: response.escalation.recommended,
            processing_ms: response.processing_ms,
        };
        tokio::spawn(async move {
            sink.record(feedback).await;
        });
    }
}

/// Deterministic follow-up suggestions from the turn's signals.
fn suggest_follow_ups(
    analysis: &MessageAnalysis,
    knowledge: &[KnowledgeSource],
    confidence: f64,
    threshold: f64,
) -> Vec<FollowUpAction> {
    let mut follow_ups = Vec::new();
    // Ambiguous but understood: ask rather than guess between candidates.
    if confidence >= threshold && !analysis.intent.secondary.is_empty() {
        follow_ups.push(FollowUpAction::RequestInformation {
            prompt: "Could you share a few more details so I can be sure I help with the right thing?"
                .to_string(),
        });
    }
    if let Some(best) = knowledge.first() {
        if best.relevance >= 0.8 {
            follow_ups.push(FollowUpAction::ShareArticle {
                citation: best.citation.clone(),
            });
        }
    }
    if confidence >= 0.9 && !analysis.sentiment.is_negative() && follow_ups.is_empty() {
        follow_ups.push(FollowUpAction::ConfirmResolution);
    }
    follow_ups
}
