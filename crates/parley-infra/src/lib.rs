//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`:
//! SQLite session storage, runtime backend selection, LLM provider clients,
//! and the configuration file loader.

pub mod backend;
pub mod config;
pub mod llm;
pub mod sqlite;
