//! Conversation service - the application's front door.
//!
//! Serializes turns per conversation, drives the lifecycle state machine,
//! runs the AI orchestrator, applies business rules to its output, and keeps
//! the per-conversation topic stack.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex as TurnMutex;
use tracing::{info, warn};

use crate::config::ConversationConfig;
use crate::domain::ai::{AiRequest, AiResponse, Attachment, FollowUpAction};
use crate::domain::context::{ContextError, ContextStack};
use crate::domain::conversation::{
    Channel, Conversation, ConversationStatus, GenerationMetadata, Message, TurnOutcome,
};
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::rules::{RuleDecision, RulesEngine};
use crate::ports::{ConversationRepository, EscalationSink, EscalationTicket, MessageRepository};

use super::errors::ProcessError;
use super::orchestrator::AiOrchestrator;

/// Default topic for conversations opened without one.
const DEFAULT_TOPIC: &str = "general";

/// Everything a caller learns from one processed turn.
#[derive(Debug)]
pub struct TurnReport {
    /// Conversation the turn ran on. Differs from the requested id when the
    /// requested conversation was terminal and a fresh one was opened.
    pub conversation_id: ConversationId,
    /// Lifecycle status after the turn.
    pub status: ConversationStatus,
    /// The stored agent reply.
    pub reply: Message,
    /// Full orchestrator output for the turn.
    pub response: AiResponse,
    /// What the rules engine decided.
    pub decision: RuleDecision,
}

/// Orchestrates conversations end to end.
pub struct ConversationService {
    conversations: Arc<dyn ConversationRepository>,
    messages: Arc<dyn MessageRepository>,
    orchestrator: Arc<AiOrchestrator>,
    rules: Arc<RulesEngine>,
    escalations: Arc<dyn EscalationSink>,
    config: ConversationConfig,
    /// Per-conversation turn locks; one turn in flight per conversation.
    locks: StdMutex<HashMap<ConversationId, Arc<TurnMutex<()>>>>,
    /// Working topic stacks for open conversations.
    contexts: StdMutex<HashMap<ConversationId, ContextStack>>,
}

impl ConversationService {
    /// Creates the service over its collaborators.
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        messages: Arc<dyn MessageRepository>,
        orchestrator: Arc<AiOrchestrator>,
        rules: Arc<RulesEngine>,
        escalations: Arc<dyn EscalationSink>,
        config: ConversationConfig,
    ) -> Self {
        Self {
            conversations,
            messages,
            orchestrator,
            rules,
            escalations,
            config,
            locks: StdMutex::new(HashMap::new()),
            contexts: StdMutex::new(HashMap::new()),
        }
    }

    /// Opens a conversation for a user on a channel.
    ///
    /// A user holds at most one open conversation per channel; a second open
    /// attempt is rejected with the existing conversation's id in the error
    /// details.
    pub async fn start_conversation(
        &self,
        user_id: UserId,
        channel: Channel,
        topic: Option<String>,
    ) -> Result<Conversation, ProcessError> {
        if let Some(existing) = self.conversations.find_open(&user_id, channel).await? {
            return Err(ProcessError::Domain(
                DomainError::new(
                    ErrorCode::DuplicateOpenConversation,
                    format!("User {user_id} already has an open {channel} conversation"),
                )
                .with_detail("existing_conversation_id", existing.id().to_string()),
            ));
        }

        let conversation = Conversation::new(user_id, channel);
        self.conversations.save(&conversation).await?;
        self.init_context(conversation.id(), topic.as_deref().unwrap_or(DEFAULT_TOPIC));
        info!(conversation_id = %conversation.id(), %channel, "conversation started");
        Ok(conversation)
    }

    /// Processes one user message as a full turn.
    ///
    /// If the target conversation is terminal, a fresh conversation is
    /// opened for the same user and channel and the turn runs there; the
    /// report carries the new id. A mid-turn failure rolls the conversation
    /// back to `Active` so the user can retry.
    pub async fn process_message(
        &self,
        conversation_id: ConversationId,
        text: impl Into<String>,
    ) -> Result<TurnReport, ProcessError> {
        self.process_message_with_attachments(conversation_id, text, Vec::new())
            .await
    }

    /// `process_message` with attachments accompanying the text.
    pub async fn process_message_with_attachments(
        &self,
        conversation_id: ConversationId,
        text: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<TurnReport, ProcessError> {
        // Validate before touching any state.
        let request = AiRequest::new(conversation_id, text)?.with_attachments(attachments);
        let lock = self.turn_lock(conversation_id);
        let _guard = lock.lock().await;

        let mut conversation = self.conversations.find_by_id(conversation_id).await?;
        if let Err(err) = conversation.begin_processing() {
            if err.code != ErrorCode::ConversationTerminal {
                return Err(ProcessError::Domain(err));
            }
            // Archived conversation: a new message opens a fresh one.
            conversation = self.reopen(&conversation).await?;
            conversation
                .begin_processing()
                .map_err(ProcessError::Domain)?;
        }
        let id = conversation.id();
        self.conversations.save(&conversation).await?;

        match self.run_turn(&mut conversation, request).await {
            Ok(report) => Ok(report),
            Err(err) => {
                conversation.rollback_processing();
                if let Err(save_err) = self.conversations.save(&conversation).await {
                    warn!(conversation_id = %id, error = %save_err, "rollback save failed");
                }
                Err(err)
            }
        }
    }

    /// Pushes a digression topic onto the conversation's context stack.
    ///
    /// Fails closed at the depth bound; the active topic is unchanged.
    pub async fn switch_topic(
        &self,
        conversation_id: ConversationId,
        topic: impl Into<String>,
    ) -> Result<(), ProcessError> {
        // Existence check keeps the error surface consistent.
        self.conversations.find_by_id(conversation_id).await?;
        let mut contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
        let stack = contexts
            .entry(conversation_id)
            .or_insert_with(|| self.new_stack(DEFAULT_TOPIC));
        stack.push_topic(topic).map_err(|err| match err {
            ContextError::StackDepthExceeded { max_depth } => ProcessError::Domain(
                DomainError::new(ErrorCode::StackDepthExceeded, err.to_string())
                    .with_detail("max_depth", max_depth.to_string()),
            ),
        })
    }

    /// Pops the active digression, resuming the parent topic as it was left.
    ///
    /// Returns false at the base topic, which is never popped.
    pub async fn resume_topic(
        &self,
        conversation_id: ConversationId,
    ) -> Result<bool, ProcessError> {
        self.conversations.find_by_id(conversation_id).await?;
        let mut contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
        Ok(contexts
            .get_mut(&conversation_id)
            .and_then(|stack| stack.pop_topic())
            .is_some())
    }

    /// The topic the conversation is currently working in.
    pub fn active_topic(&self, conversation_id: ConversationId) -> Option<String> {
        let contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
        contexts
            .get(&conversation_id)
            .map(|stack| stack.active().topic().to_string())
    }

    /// Sweeps open conversations, abandoning those idle past the configured
    /// threshold. Returns the abandoned ids. Driven by an external
    /// scheduler.
    pub async fn check_timeouts(&self) -> Result<Vec<ConversationId>, ProcessError> {
        let now = Timestamp::now();
        let threshold = self.config.inactivity_timeout();
        let mut abandoned = Vec::new();

        for mut conversation in self.conversations.list_open().await? {
            if conversation.check_timeout(now, threshold) {
                self.conversations.save(&conversation).await?;
                self.drop_working_state(conversation.id());
                info!(conversation_id = %conversation.id(), "conversation abandoned after inactivity");
                abandoned.push(conversation.id());
            }
        }
        Ok(abandoned)
    }

    /// Records the user's satisfaction score on a resolved conversation.
    pub async fn record_satisfaction(
        &self,
        conversation_id: ConversationId,
        score: u8,
    ) -> Result<(), ProcessError> {
        let mut conversation = self.conversations.find_by_id(conversation_id).await?;
        conversation
            .record_satisfaction(score)
            .map_err(ProcessError::Domain)?;
        self.conversations.save(&conversation).await?;
        Ok(())
    }

    // === Turn internals ===

    async fn run_turn(
        &self,
        conversation: &mut Conversation,
        mut request: AiRequest,
    ) -> Result<TurnReport, ProcessError> {
        let id = conversation.id();
        request.conversation_id = id;
        let request = match self.active_topic(id) {
            Some(topic) => request.with_topic(topic),
            None => {
                self.init_context(id, DEFAULT_TOPIC);
                request.with_topic(DEFAULT_TOPIC)
            }
        };

        let response = self.orchestrator.process(&request).await;
        let decision = self.rules.evaluate(&self.rule_context(conversation, &response), None);
        let outcome = decide_outcome(&response, &decision);

        let user_message = Message::user(id, request.message.clone())
            .with_analysis(AiOrchestrator::analysis_of(&response));
        let reply = Message::agent(id, response.text.clone())
            .with_generation(GenerationMetadata {
                provider: response.model_used.clone(),
                fallback_level: response.fallback_level,
                latency_ms: response.processing_ms,
                tokens_used: response.tokens.total(),
            });
        self.messages.append(&user_message).await?;
        self.messages.append(&reply).await?;
        conversation.record_message();
        conversation.record_message();
        conversation.record_turn_signals(response.confidence, response.sentiment.score());

        conversation
            .complete_turn(outcome)
            .map_err(ProcessError::Domain)?;
        self.conversations.save(conversation).await?;

        self.record_context_turn(id, &response);
        if conversation.is_escalated() {
            self.file_ticket(conversation, &response, &decision).await;
            self.drop_working_state(id);
        } else if !conversation.is_open() {
            self.drop_working_state(id);
        }

        Ok(TurnReport {
            conversation_id: id,
            status: conversation.status(),
            reply,
            response,
            decision,
        })
    }

    /// Combined evaluation context for the rules engine.
    fn rule_context(
        &self,
        conversation: &Conversation,
        response: &AiResponse,
    ) -> serde_json::Value {
        let (topic, depth) = {
            let contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
            contexts
                .get(&conversation.id())
                .map(|s| (s.active().topic().to_string(), s.depth()))
                .unwrap_or_else(|| (DEFAULT_TOPIC.to_string(), 1))
        };
        serde_json::json!({
            "conversation": conversation.rule_context(),
            "analysis": response.rule_context(),
            "context": { "topic": topic, "depth": depth },
        })
    }

    /// Files the escalation ticket. A sink failure is logged and retried out
    /// of band; it never reverses the escalation.
    async fn file_ticket(
        &self,
        conversation: &Conversation,
        response: &AiResponse,
        decision: &RuleDecision,
    ) {
        let ticket = EscalationTicket {
            conversation_id: conversation.id(),
            user_id: conversation.user_id().clone(),
            priority: conversation.priority(),
            reason: conversation
                .escalation_reason()
                .unwrap_or("escalated")
                .to_string(),
            queue: decision.route.clone(),
        };
        match self.escalations.create_ticket(&ticket).await {
            Ok(ticket_id) => {
                info!(
                    conversation_id = %conversation.id(),
                    %ticket_id,
                    fallback_level = response.fallback_level,
                    "escalation ticket created"
                );
            }
            Err(err) => {
                warn!(
                    conversation_id = %conversation.id(),
                    error = %err,
                    "escalation ticket creation failed; conversation stays escalated"
                );
            }
        }
    }

    async fn reopen(&self, terminal: &Conversation) -> Result<Conversation, ProcessError> {
        // The user may already hold an open conversation on this channel;
        // a second open one per (user, channel) is never allowed.
        if let Some(existing) = self
            .conversations
            .find_open(terminal.user_id(), terminal.channel())
            .await?
        {
            info!(
                old_conversation_id = %terminal.id(),
                conversation_id = %existing.id(),
                "message on a terminal conversation resumed the open one"
            );
            return Ok(existing);
        }
        let replacement = Conversation::new(terminal.user_id().clone(), terminal.channel());
        self.conversations.save(&replacement).await?;
        self.init_context(replacement.id(), DEFAULT_TOPIC);
        info!(
            old_conversation_id = %terminal.id(),
            conversation_id = %replacement.id(),
            "terminal conversation replaced by a fresh one"
        );
        Ok(replacement)
    }

    fn record_context_turn(&self, id: ConversationId, response: &AiResponse) {
        let mut contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(stack) = contexts.get_mut(&id) {
            stack.record_turn(
                Some(response.intent.clone()),
                &response.entities,
                &response.knowledge_sources,
            );
        }
    }

    fn init_context(&self, id: ConversationId, topic: &str) {
        let mut contexts = self.contexts.lock().unwrap_or_else(|e| e.into_inner());
        contexts.insert(id, self.new_stack(topic));
    }

    fn new_stack(&self, topic: &str) -> ContextStack {
        ContextStack::with_max_depth(topic, self.config.max_context_depth)
    }

    fn drop_working_state(&self, id: ConversationId) {
        self.contexts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        self.locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    fn turn_lock(&self, id: ConversationId) -> Arc<TurnMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(id).or_default())
    }
}

/// Maps the orchestrator output and rule decision to a turn outcome.
///
/// Rules make the final call on escalation and auto-resolution; the
/// orchestrator's recommendation escalates only when no rule already did.
fn decide_outcome(response: &AiResponse, decision: &RuleDecision) -> TurnOutcome {
    if let Some(reason) = &decision.escalate {
        return TurnOutcome::Escalate {
            reason: reason.clone(),
        };
    }
    if response.escalation.recommended {
        return TurnOutcome::Escalate {
            reason: response
                .escalation
                .reason
                .clone()
                .unwrap_or_else(|| "escalation recommended".to_string()),
        };
    }
    if decision.auto_resolve {
        return TurnOutcome::Resolve;
    }
    if response
        .follow_ups
        .iter()
        .any(|f| matches!(f, FollowUpAction::RequestInformation { .. }))
    {
        return TurnOutcome::AwaitInformation;
    }
    TurnOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::adapters::ai::{
        MockEmotionDetector, MockEntityExtractor, MockGenerationProvider, MockIntentClassifier,
        MockSentimentAnalyzer,
    };
    use crate::adapters::memory::{
        CannedKnowledgeRetriever, InMemoryConversationRepository, InMemoryMessageRepository,
        RecordingEscalationSink, RecordingFeedbackSink,
    };
    use crate::application::orchestrator::{AnalysisPipeline, ProviderRouter};
    use crate::config::OrchestratorConfig;
    use crate::domain::analysis::Intent;
    use crate::domain::rules::RuleSet;
    use crate::ports::GenerationProvider;

    struct Fixture {
        service: ConversationService,
        conversations: Arc<InMemoryConversationRepository>,
        messages: Arc<InMemoryMessageRepository>,
        escalations: Arc<RecordingEscalationSink>,
    }

    fn fixture_with(
        providers: Vec<Arc<dyn GenerationProvider>>,
        rules_json: Option<serde_json::Value>,
    ) -> Fixture {
        let conversations = Arc::new(InMemoryConversationRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let escalations = Arc::new(RecordingEscalationSink::new());

        let pipeline = AnalysisPipeline::new(
            Arc::new(
                MockIntentClassifier::new(Intent::new("general_question", 0.85))
                    .with_keyword("refund", Intent::new("refund_request", 0.9)),
            ),
            Arc::new(MockEntityExtractor::new()),
            Arc::new(MockSentimentAnalyzer::new().with_keyword("terrible", -0.8)),
            Arc::new(MockEmotionDetector::new()),
            Duration::from_millis(500),
        );
        let orchestrator = Arc::new(AiOrchestrator::new(
            pipeline,
            Arc::new(CannedKnowledgeRetriever::new()),
            ProviderRouter::new(providers),
            Arc::new(RecordingFeedbackSink::new()),
            OrchestratorConfig::default(),
        ));
        let rules = Arc::new(match rules_json {
            Some(json) => RulesEngine::new(RuleSet::from_json(&json.to_string()).unwrap()),
            None => RulesEngine::default(),
        });

        let service = ConversationService::new(
            conversations.clone(),
            messages.clone(),
            orchestrator,
            rules,
            escalations.clone(),
            ConversationConfig::default(),
        );
        Fixture {
            service,
            conversations,
            messages,
            escalations,
        }
    }

    fn healthy_provider() -> Vec<Arc<dyn GenerationProvider>> {
        vec![Arc::new(
            MockGenerationProvider::new("primary").with_answer("Here's how that works.", 0.92),
        )]
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn one_open_conversation_per_user_and_channel() {
        let fx = fixture_with(healthy_provider(), None);
        fx.service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();

        let err = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ProcessError::Domain(ref d) if d.code == ErrorCode::DuplicateOpenConversation)
        );

        // A different channel is fine.
        fx.service
            .start_conversation(user(), Channel::Email, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn successful_turn_stores_both_messages_and_stays_active() {
        let fx = fixture_with(healthy_provider(), None);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();

        let report = fx
            .service
            .process_message(conversation.id(), "How do I change my plan?")
            .await
            .unwrap();

        assert_eq!(report.status, ConversationStatus::Active);
        assert_eq!(report.reply.content(), "Here's how that works.");
        assert_eq!(fx.messages.len(), 2);

        let stored = fx
            .conversations
            .find_by_id(conversation.id())
            .await
            .unwrap();
        assert_eq!(stored.counters().messages, 2);
        assert_eq!(stored.counters().turns, 1);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_state_change() {
        let fx = fixture_with(healthy_provider(), None);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();

        let err = fx
            .service
            .process_message(conversation.id(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Validation(_)));

        let stored = fx
            .conversations
            .find_by_id(conversation.id())
            .await
            .unwrap();
        assert_eq!(stored.status(), ConversationStatus::Active);
        assert!(fx.messages.is_empty());
    }

    #[tokio::test]
    async fn escalation_rule_ends_the_conversation_and_files_a_ticket() {
        let rules = serde_json::json!([
            {"id": "negative-refund", "type": "escalation", "priority": 100,
             "condition": {"all": [
                {"field": "analysis.intent", "op": "equals", "value": "refund_request"},
                {"field": "analysis.sentiment", "op": "less_than", "value": -0.3},
             ]},
             "actions": [{"type": "escalate", "reason": "upset refund request"},
                         {"type": "route", "queue": "billing"}]},
        ]);
        let fx = fixture_with(healthy_provider(), Some(rules));
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();

        let report = fx
            .service
            .process_message(conversation.id(), "This is terrible, I want a refund")
            .await
            .unwrap();

        assert_eq!(report.status, ConversationStatus::Escalated);
        let tickets = fx.escalations.tickets();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].reason, "upset refund request");
        assert_eq!(tickets[0].queue.as_deref(), Some("billing"));
    }

    #[tokio::test]
    async fn ticket_sink_failure_does_not_reverse_the_escalation() {
        let rules = serde_json::json!([
            {"id": "always-escalate", "type": "escalation", "priority": 1,
             "condition": {"field": "analysis.intent", "op": "equals", "value": "refund_request"},
             "actions": [{"type": "escalate", "reason": "policy"}]},
        ]);
        let fx = fixture_with(healthy_provider(), Some(rules));
        fx.escalations.set_failing(true);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();

        let report = fx
            .service
            .process_message(conversation.id(), "refund please")
            .await
            .unwrap();
        assert_eq!(report.status, ConversationStatus::Escalated);
        assert!(fx.escalations.tickets().is_empty());
    }

    #[tokio::test]
    async fn message_on_terminal_conversation_opens_a_fresh_one() {
        let fx = fixture_with(healthy_provider(), None);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();
        let mut stored = fx
            .conversations
            .find_by_id(conversation.id())
            .await
            .unwrap();
        stored.resolve().unwrap();
        fx.conversations.save(&stored).await.unwrap();

        let report = fx
            .service
            .process_message(conversation.id(), "actually, one more thing")
            .await
            .unwrap();

        assert_ne!(report.conversation_id, conversation.id());
        assert_eq!(report.status, ConversationStatus::Active);
        // The archived conversation is untouched.
        let archived = fx
            .conversations
            .find_by_id(conversation.id())
            .await
            .unwrap();
        assert_eq!(archived.status(), ConversationStatus::Resolved);
    }

    #[tokio::test]
    async fn message_on_terminal_conversation_resumes_an_existing_open_one() {
        let fx = fixture_with(healthy_provider(), None);
        let first = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();
        let mut stored = fx.conversations.find_by_id(first.id()).await.unwrap();
        stored.resolve().unwrap();
        fx.conversations.save(&stored).await.unwrap();

        // The user already opened a second conversation before writing to
        // the archived one.
        let second = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();

        let report = fx
            .service
            .process_message(first.id(), "following up on my old ticket")
            .await
            .unwrap();

        // The turn ran on the open conversation; no third one was created.
        assert_eq!(report.conversation_id, second.id());
        let open = fx.conversations.list_open().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id(), second.id());
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_conversation_are_serialized() {
        let fx = fixture_with(healthy_provider(), None);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();
        let id = conversation.id();

        let (first, second) = tokio::join!(
            fx.service.process_message(id, "what does my plan include?"),
            fx.service.process_message(id, "and how do I upgrade?"),
        );

        // Neither turn observes the other mid-flight.
        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(first.status, ConversationStatus::Active);
        assert_eq!(second.status, ConversationStatus::Active);

        let stored = fx.conversations.find_by_id(id).await.unwrap();
        assert_eq!(stored.counters().turns, 2);
        assert_eq!(stored.counters().messages, 4);

        // Turns were persisted whole, in arrival order.
        let history = fx.messages.list_by_conversation(id).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].content(), "what does my plan include?");
        assert_eq!(history[2].content(), "and how do I upgrade?");
    }

    #[tokio::test]
    async fn storage_failure_mid_turn_rolls_back_to_active() {
        let fx = fixture_with(healthy_provider(), None);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();

        fx.conversations.set_fail_saves(true);
        let err = fx
            .service
            .process_message(conversation.id(), "hello?")
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        fx.conversations.set_fail_saves(false);
        let report = fx
            .service
            .process_message(conversation.id(), "hello again")
            .await
            .unwrap();
        assert_eq!(report.status, ConversationStatus::Active);
    }

    #[tokio::test]
    async fn topic_stack_round_trip() {
        let fx = fixture_with(healthy_provider(), None);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, Some("billing".into()))
            .await
            .unwrap();
        let id = conversation.id();

        assert_eq!(fx.service.active_topic(id).as_deref(), Some("billing"));
        fx.service.switch_topic(id, "shipping").await.unwrap();
        assert_eq!(fx.service.active_topic(id).as_deref(), Some("shipping"));

        assert!(fx.service.resume_topic(id).await.unwrap());
        assert_eq!(fx.service.active_topic(id).as_deref(), Some("billing"));
        // Base topic is never popped.
        assert!(!fx.service.resume_topic(id).await.unwrap());
        assert_eq!(fx.service.active_topic(id).as_deref(), Some("billing"));
    }

    #[tokio::test]
    async fn switch_topic_fails_closed_at_the_depth_bound() {
        let fx = fixture_with(healthy_provider(), None);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, Some("t0".into()))
            .await
            .unwrap();
        let id = conversation.id();

        for i in 1..5 {
            fx.service.switch_topic(id, format!("t{i}")).await.unwrap();
        }
        let err = fx.service.switch_topic(id, "t5").await.unwrap_err();
        assert!(
            matches!(err, ProcessError::Domain(ref d) if d.code == ErrorCode::StackDepthExceeded)
        );
        assert_eq!(fx.service.active_topic(id).as_deref(), Some("t4"));
    }

    #[tokio::test]
    async fn satisfaction_only_on_resolved_conversations() {
        let fx = fixture_with(healthy_provider(), None);
        let conversation = fx
            .service
            .start_conversation(user(), Channel::Web, None)
            .await
            .unwrap();

        let err = fx
            .service
            .record_satisfaction(conversation.id(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Domain(_)));

        let mut stored = fx
            .conversations
            .find_by_id(conversation.id())
            .await
            .unwrap();
        stored.resolve().unwrap();
        fx.conversations.save(&stored).await.unwrap();

        fx.service
            .record_satisfaction(conversation.id(), 5)
            .await
            .unwrap();
    }
}
