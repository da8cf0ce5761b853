//! Server-Sent Events (SSE) infrastructure for real-time notifications.
//!
//! This crate owns the process-local fan-out of notification events to the
//! live streams of authenticated users.
//!
//! # Architecture
//!
//! - **Many connections per user**: a user may hold one stream per tab or
//!   device; all of them receive every event addressed to that user.
//! - **Dual-index registry**: O(1) lookups for both connection management and
//!   user-scoped routing via separate DashMap indices. Users without live
//!   connections have no entry at all.
//! - **Best-effort delivery**: a push to a connection whose client is gone
//!   evicts that connection and never disturbs its siblings. Persisted
//!   notifications remain the source of truth; a reconnecting client
//!   resynchronizes from the `initial` snapshot.
//! - **Type-safe envelopes**: every frame is an `Envelope` serialized as
//!   `{"type": ..., "payload": ...}`.
//!
//! # Message Flow
//!
//! 1. Frontend opens the stream via `GET /notifications/stream`
//! 2. Web layer authenticates the caller and loads the snapshot
//! 3. `Manager::open_stream` queues the `initial` frame, registers the
//!    connection and starts its heartbeat
//! 4. A domain operation persists a notification and publishes a `DomainEvent`
//! 5. `SseDomainEventHandler` turns it into an envelope and the registry pushes
//!    it to each of the user's connections
//! 6. When the client goes away the stream is dropped and the connection is
//!    removed from the registry exactly once
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry, sinks and type-safe ConnectionId
//! - `lifecycle`: per-connection heartbeat and teardown
//! - `manager`: High-level entry point (delegates to ConnectionRegistry)
//! - `message`: Envelope and snapshot definitions
//! - `domain_event_handler`: bridge from `events::DomainEvent` to envelopes

pub mod connection;
pub mod domain_event_handler;
pub mod lifecycle;
pub mod manager;
pub mod message;

pub use manager::Manager;
