//! Server-Sent Events (SSE) infrastructure for the poster launch broadcast.
//!
//! Every open browser tab holds one SSE connection. Administrative actions
//! (launching or resetting the poster) trigger a broadcast that fans out to
//! all of them.
//!
//! # Architecture
//!
//! - **Process-local registry**: `ConnectionRegistry` owns the set of open
//!   subscribers, keyed by a server-generated `ConnectionId`.
//! - **Abstract sinks**: the registry writes through the `Sink` trait; the
//!   production sink feeds an axum SSE response, tests inject fakes.
//! - **Contained failures**: a failed push prunes that one subscriber and
//!   never interrupts delivery to the rest.
//! - **Ephemeral messages**: nothing is stored or replayed. A client that
//!   missed an event re-fetches poster state on reconnect.
//!
//! # Message Flow
//!
//! 1. Browser opens the stream endpoint
//! 2. `Manager::connect` writes a `CONNECTED` handshake carrying the new
//!    connection id, then registers the subscriber
//! 3. An admin action calls `Manager::trigger` (or `Manager::broadcast`)
//! 4. The registry serializes once, pushes to every subscriber and prunes the
//!    ones whose push failed
//! 5. The returned `ConnectionGuard` unregisters the connection when the
//!    response stream is dropped
//!
//! # Example: triggering a broadcast
//!
//! ```rust,ignore
//! let client_count = app_state
//!     .sse_manager
//!     .trigger(serde_json::json!({"type": "POSTER_LAUNCHED"}))?;
//! ```
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry, Sink and the channel-backed sink
//! - `manager`: connect/disconnect/broadcast/trigger entry points
//! - `message`: wire message and event type definitions
//! - `error`: sink and caller-facing error types

pub mod connection;
pub mod error;
pub mod manager;
pub mod message;

pub use manager::{ConnectionGuard, Manager};
