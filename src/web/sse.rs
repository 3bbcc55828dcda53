//! Server-Sent Events stream of committed scene snapshots

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::scene::SceneSnapshot;

use super::ApiState;

/// SSE stream of scene updates
pub async fn scene_stream(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.handle.subscribe();

    // Convert broadcast receiver to a stream; lagged receivers just skip
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(snapshot) => Some(Ok(snapshot_to_event(&snapshot))),
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn snapshot_to_event(snapshot: &SceneSnapshot) -> Event {
    let data = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());
    Event::default().event("scene").data(data)
}
