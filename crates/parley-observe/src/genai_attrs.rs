//! OpenTelemetry GenAI Semantic Convention attribute names and values.
//!
//! `tracing` macros need literal field names, so the `gen_ai.complete` span
//! in `ChatService` declares its fields inline; these constants name the
//! fields recorded after the call and the shared operation/provider values.

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

// --- Operation name values ---

/// Standard chat completion operation.
pub const OP_CHAT: &str = "chat";

// --- Provider name values ---

pub const PROVIDER_OLLAMA: &str = "ollama";

pub const PROVIDER_OPENAI_COMPATIBLE: &str = "openai_compatible";

/// Canned-reply provider; no model is contacted.
pub const PROVIDER_FIXED: &str = "fixed";
