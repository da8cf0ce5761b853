//! SSE HTTP handler for the web layer.
//!
//! The registry, envelope and per-connection lifecycle live in the `sse`
//! crate; this module only adapts a `NotificationStream` to an axum response.

pub mod handler;
