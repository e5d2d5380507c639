//! Observability setup for Parley: subscriber initialization and GenAI
//! span attribute names.

pub mod genai_attrs;
pub mod tracing_setup;
