//! Core types and services for mstr-lineage-mcp.
//!
//! This crate owns the per-request authentication state machine, the runtime
//! settings read by the HTTP gate, the startup capability probe, and the
//! query engine seam with its `SurrealDB` implementation.

pub mod auth;
pub mod capabilities;
pub mod config;
pub mod engine;
