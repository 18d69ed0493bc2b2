use crate::{AppState, Error};
use async_stream::stream;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use log::*;
use sse::connection::ChannelSink;
use std::time::Duration;
use tokio::sync::mpsc;

/// GET a long-lived event stream of poster state changes.
///
/// The first frame is always `{"type":"CONNECTED","clientId":"<id>"}`; after
/// that only broadcasts are written. Clients re-fetch `/poster/state` on
/// (re)connect, since missed events are never replayed.
#[utoipa::path(
    get,
    path = "/poster/stream",
    responses(
        (status = 200, description = "Event stream opened", content_type = "text/event-stream", body = String),
        (status = 500, description = "Internal Server Error")
    )
)]
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let guard = app_state.sse_manager.connect(ChannelSink::new(tx))?;
    debug!("Establishing SSE connection {}", guard.id());

    // The guard travels with the stream: when axum drops the response (client
    // gone, abort, shutdown) the connection is unregistered.
    let stream = stream! {
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    let keep_alive =
        KeepAlive::new().interval(Duration::from_secs(app_state.config().sse_keep_alive_secs));

    Ok((
        [(header::CONNECTION, "keep-alive")],
        Sse::new(stream).keep_alive(keep_alive),
    ))
}

#[cfg(test)]
mod tests {
    use crate::router::define_routes;
    use crate::test_support::{app_state, next_event};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn stream_request() -> Request<Body> {
        Request::get("/poster/stream")
            .header(header::ORIGIN, "https://event.example.com")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn stream_opens_with_connected_handshake() -> anyhow::Result<()> {
        let state = app_state();
        let app = define_routes(state.clone());

        let response = app.oneshot(stream_request()).await?;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let mut body = response.into_body().into_data_stream();
        let connected = next_event(&mut body).await;
        assert_eq!(connected["type"], "CONNECTED");
        assert!(connected["clientId"].as_str().is_some_and(|id| !id.is_empty()));
        assert_eq!(state.sse_manager.client_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn dropping_the_response_unregisters_the_connection() -> anyhow::Result<()> {
        let state = app_state();
        let app = define_routes(state.clone());

        let first = app.clone().oneshot(stream_request()).await?;
        let second = app.oneshot(stream_request()).await?;
        assert_eq!(state.sse_manager.client_count(), 2);

        drop(first);
        assert_eq!(state.sse_manager.client_count(), 1);

        drop(second);
        assert_eq!(state.sse_manager.client_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn shutdown_ends_open_streams() -> anyhow::Result<()> {
        let state = app_state();
        let app = define_routes(state.clone());

        let response = app.oneshot(stream_request()).await?;
        let mut body = response.into_body().into_data_stream();
        next_event(&mut body).await;

        assert_eq!(state.sse_manager.shutdown(), 1);

        use futures::StreamExt;
        let end = tokio::time::timeout(std::time::Duration::from_secs(2), body.next()).await?;
        assert!(end.is_none());
        Ok(())
    }
}
