//! Business logic and port trait definitions for Parley.
//!
//! This crate defines the "ports" (the `SessionStore` and `LlmProvider`
//! traits) that the infrastructure layer implements, plus the session
//! lifecycle manager and the chat exchange built on them. It depends on
//! `parley-types` and the attribute names in `parley-observe` -- never on
//! `parley-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod session;
