//! Deskflow - Automated Support Agent Orchestration Core
//!
//! This crate implements the conversation orchestration core of an automated
//! support-interaction agent: lifecycle state machine, topic context stack,
//! AI analysis/generation orchestration, and business rule evaluation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
