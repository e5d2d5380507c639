//! Session persistence port, in-memory backend, and lifecycle manager.

pub mod manager;
pub mod memory;
pub mod store;
