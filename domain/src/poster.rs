//! Current poster state and the admin actions that change it.
//!
//! State is written first and broadcast second, so a client that re-fetches
//! state after receiving an event always sees the change.
use crate::error::Error;
use chrono::{DateTime, Utc};
use log::*;
use serde::Serialize;
use sse::message::{EventType, Message};
use sse::Manager;
use tokio::sync::RwLock;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosterState {
    pub launched: bool,
    /// When the poster was last launched or reset; `None` until then.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outcome of a launch or reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosterUpdate {
    pub poster: PosterState,
    /// Connections the change was broadcast to (advisory).
    pub client_count: usize,
}

#[derive(Debug, Default)]
pub struct PosterStore {
    state: RwLock<PosterState>,
}

impl PosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn set_launched(&self, launched: bool) -> PosterState {
        let mut state = self.state.write().await;
        *state = PosterState {
            launched,
            updated_at: Some(Utc::now()),
        };
        *state
    }
}

pub async fn state(store: &PosterStore) -> PosterState {
    *store.state.read().await
}

pub async fn launch(store: &PosterStore, sse_manager: &Manager) -> Result<PosterUpdate, Error> {
    change(store, sse_manager, true).await
}

pub async fn reset(store: &PosterStore, sse_manager: &Manager) -> Result<PosterUpdate, Error> {
    change(store, sse_manager, false).await
}

async fn change(
    store: &PosterStore,
    sse_manager: &Manager,
    launched: bool,
) -> Result<PosterUpdate, Error> {
    let poster = store.set_launched(launched).await;

    let event_type = if launched {
        EventType::PosterLaunched
    } else {
        EventType::PosterReset
    };
    debug!("Poster state changed, broadcasting {event_type}");

    let client_count = sse_manager.broadcast(&Message::new(event_type))?;

    Ok(PosterUpdate {
        poster,
        client_count,
    })
}
