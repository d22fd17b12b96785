//! AI adapters.
//!
//! Deterministic, scriptable implementations of the analysis and generation
//! ports. Real provider integrations plug in behind the same ports.

mod mock;

pub use mock::{
    MockEmotionDetector, MockEntityExtractor, MockGeneration, MockGenerationProvider,
    MockIntentClassifier, MockSentimentAnalyzer,
};
