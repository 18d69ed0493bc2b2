use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use log::*;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{AppState, Error};

/// Response body for a broadcast trigger.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub success: bool,
    /// Connections held when the broadcast started. Advisory only: it counts
    /// attempts, not deliveries.
    pub client_count: usize,
}

/// POST an event to every open poster stream.
///
/// The body is an event descriptor with at least a string `type`; any other
/// fields are forwarded to clients unchanged. Callers are responsible for
/// persisting the underlying state change before triggering.
#[utoipa::path(
    post,
    path = "/poster/broadcast",
    request_body(
        content = Object,
        description = "Event descriptor",
        example = json!({"type": "POSTER_LAUNCHED"})
    ),
    responses(
        (status = 200, description = "Event broadcast to all open streams", body = BroadcastResponse),
        (status = 400, description = "Missing or unusable event type"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn broadcast(
    State(app_state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(descriptor) = payload.map_err(|rejection| {
        warn!("Rejected broadcast trigger body: {rejection}");
        Error::bad_request(rejection.body_text())
    })?;

    debug!("POST broadcast trigger: {descriptor}");

    let client_count = app_state.sse_manager.trigger(descriptor)?;

    Ok(Json(BroadcastResponse {
        success: true,
        client_count,
    }))
}

#[cfg(test)]
mod tests {
    use crate::router::define_routes;
    use crate::test_support::{app_state, json_body, next_event, post_json};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn trigger_with_no_connections_succeeds_with_zero() -> anyhow::Result<()> {
        let app = define_routes(app_state());

        let response = app
            .oneshot(post_json("/poster/broadcast", json!({"type": "POSTER_LAUNCHED"})))
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"success": true, "clientCount": 0})
        );
        Ok(())
    }

    #[tokio::test]
    async fn launch_then_reset_reaches_only_open_streams() -> anyhow::Result<()> {
        let state = app_state();
        let app = define_routes(state.clone());

        let mut streams = Vec::new();
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(
                    Request::get("/poster/stream")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await?;
            let mut body = response.into_body().into_data_stream();
            assert_eq!(next_event(&mut body).await["type"], "CONNECTED");
            streams.push(Some(body));
        }

        let response = app
            .clone()
            .oneshot(post_json("/poster/broadcast", json!({"type": "POSTER_LAUNCHED"})))
            .await?;
        assert_eq!(
            json_body(response).await,
            json!({"success": true, "clientCount": 3})
        );
        for body in streams.iter_mut().flatten() {
            assert_eq!(next_event(body).await, json!({"type": "POSTER_LAUNCHED"}));
        }

        // Connection 2 goes away.
        streams[1].take();

        let response = app
            .oneshot(post_json("/poster/broadcast", json!({"type": "POSTER_RESET"})))
            .await?;
        assert_eq!(
            json_body(response).await,
            json!({"success": true, "clientCount": 2})
        );
        for body in streams.iter_mut().flatten() {
            assert_eq!(next_event(body).await, json!({"type": "POSTER_RESET"}));
        }
        assert_eq!(state.sse_manager.client_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn extra_descriptor_fields_are_forwarded() -> anyhow::Result<()> {
        let app = define_routes(app_state());

        let response = app
            .clone()
            .oneshot(Request::get("/poster/stream").body(Body::empty()).unwrap())
            .await?;
        let mut body = response.into_body().into_data_stream();
        next_event(&mut body).await;

        app.oneshot(post_json(
            "/poster/broadcast",
            json!({"type": "WINNERS_ANNOUNCED", "round": 2}),
        ))
        .await?;

        assert_eq!(
            next_event(&mut body).await,
            json!({"type": "WINNERS_ANNOUNCED", "round": 2})
        );
        Ok(())
    }

    #[tokio::test]
    async fn descriptor_without_type_is_rejected() -> anyhow::Result<()> {
        let app = define_routes(app_state());

        let response = app
            .oneshot(post_json("/poster/broadcast", json!({"event": "POSTER_LAUNCHED"})))
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "missing `type` field");
        Ok(())
    }

    #[tokio::test]
    async fn non_json_body_is_rejected() -> anyhow::Result<()> {
        let app = define_routes(app_state());

        let response = app
            .oneshot(
                Request::post("/poster/broadcast")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("type=POSTER_LAUNCHED"))
                    .unwrap(),
            )
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["success"], false);
        Ok(())
    }
}
