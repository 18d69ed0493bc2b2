use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use domain::poster as PosterApi;
use domain::PosterUpdate;
use log::*;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::{AppState, Error};

/// Response body for a launch or reset.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PosterChangeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub update: PosterUpdate,
}

impl From<PosterUpdate> for PosterChangeResponse {
    fn from(update: PosterUpdate) -> Self {
        Self {
            success: true,
            update,
        }
    }
}

/// GET the current poster state.
///
/// Clients call this on connect and reconnect to recover anything they
/// missed while their stream was down.
#[utoipa::path(
    get,
    path = "/poster/state",
    responses(
        (status = 200, description = "Current poster state", body = domain::PosterState)
    )
)]
pub async fn read(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(PosterApi::state(&app_state.poster_store).await)
}

/// POST launch the poster and notify every open stream.
#[utoipa::path(
    post,
    path = "/poster/launch",
    responses(
        (status = 200, description = "Poster launched", body = PosterChangeResponse),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn launch(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let update = PosterApi::launch(&app_state.poster_store, &app_state.sse_manager).await?;
    info!("Poster launched, notified {} client(s)", update.client_count);

    Ok(Json(PosterChangeResponse::from(update)))
}

/// POST reset the poster and notify every open stream.
#[utoipa::path(
    post,
    path = "/poster/reset",
    responses(
        (status = 200, description = "Poster reset", body = PosterChangeResponse),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn reset(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let update = PosterApi::reset(&app_state.poster_store, &app_state.sse_manager).await?;
    info!("Poster reset, notified {} client(s)", update.client_count);

    Ok(Json(PosterChangeResponse::from(update)))
}

/// GET the number of open poster streams (diagnostics only).
#[utoipa::path(
    get,
    path = "/poster/clients",
    responses(
        (status = 200, description = "Number of open poster streams")
    )
)]
pub async fn clients(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "clientCount": app_state.sse_manager.client_count() }))
}
