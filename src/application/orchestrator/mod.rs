//! The per-turn AI pipeline: analysis fan-out, knowledge retrieval,
//! provider routing, and the generation fallback chain.

mod analysis;
mod chain;
mod orchestrator;
mod router;

pub use analysis::AnalysisPipeline;
pub use chain::{ChainOutcome, FallbackChain, TEMPLATE_MODEL};
pub use orchestrator::AiOrchestrator;
pub use router::{temperature_for_intensity, ProviderRouter};
