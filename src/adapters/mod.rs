//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - Mock analysis and generation adapters
//! - `memory` - In-memory repositories, knowledge base, and sinks

pub mod ai;
pub mod memory;
