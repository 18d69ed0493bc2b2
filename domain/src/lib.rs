//! Business operations that sit on top of the broadcast core.
//!
//! `web` talks to this crate rather than to `sse` directly for anything that
//! changes poster state, so the persist-then-broadcast ordering lives in one
//! place.
pub mod error;
pub mod poster;

pub use poster::{PosterState, PosterStore, PosterUpdate};
