use crate::controller::{broadcast_controller, health_check_controller, poster_controller};
use crate::{cors_layer, stream, AppState};
use axum::{
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Poster Launch API"
        ),
        paths(
            broadcast_controller::broadcast,
            health_check_controller::health_check,
            poster_controller::read,
            poster_controller::launch,
            poster_controller::reset,
            poster_controller::clients,
            stream::handler::sse_handler,
        ),
        components(
            schemas(
                broadcast_controller::BroadcastResponse,
                domain::PosterState,
                domain::PosterUpdate,
                poster_controller::PosterChangeResponse,
            )
        ),
        tags(
            (name = "poster_launch", description = "Real-time poster launch broadcast API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(app_state.config());

    Router::new()
        .merge(health_routes())
        .merge(poster_routes(app_state.clone()))
        .merge(sse_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn poster_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/poster/state", get(poster_controller::read))
        .route("/poster/launch", post(poster_controller::launch))
        .route("/poster/reset", post(poster_controller::reset))
        .route("/poster/clients", get(poster_controller::clients))
        .route("/poster/broadcast", post(broadcast_controller::broadcast))
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/poster/stream", get(stream::handler::sse_handler))
        .with_state(app_state)
}
