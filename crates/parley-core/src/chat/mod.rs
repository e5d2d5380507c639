//! The chat exchange: one user message in, one assistant reply out, with the
//! session transcript loaded before and persisted after.

pub mod service;
