//! Shared domain types for Parley.
//!
//! This crate contains the domain types used across the Parley service:
//! sessions and their turns, LLM request/response shapes, configuration,
//! and the error enums each layer reports.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod session;
