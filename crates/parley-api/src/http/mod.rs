//! HTTP/REST API layer for Parley.
//!
//! Axum-based REST API at `/api/` with permissive CORS and a
//! `{"detail": ...}` error body.

pub mod error;
pub mod handlers;
pub mod router;
