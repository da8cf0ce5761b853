use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use async_stream::stream;
use axum::extract::State;
use axum::http::{header, HeaderName};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use domain::notification::{self as NotificationApi, NotificationSnapshot};
use futures::StreamExt;
use log::*;
use sse::message::Snapshot;
use std::convert::Infallible;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Opens the caller's live notification stream.
///
/// The snapshot is read before anything is registered, so a storage failure
/// is answered with a JSON error and leaves no trace in the registry. Once
/// open, every frame is `data: <json envelope>`. The connection is released
/// when the client goes away and the response body is dropped.
#[utoipa::path(
    get,
    path = "/notifications/stream",
    responses(
        (status = 200, description = "text/event-stream of notification envelopes", content_type = "text/event-stream", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Notification storage unavailable")
    ),
    security(
        ("bearer_auth" = []),
        ("cookie_auth" = [])
    )
)]
pub(crate) async fn sse_handler(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("Establishing SSE connection for user {}", identity.user_id);

    let snapshot =
        NotificationApi::snapshot(app_state.notifications.as_ref(), identity.user_id).await?;
    let initial = wire_snapshot(&snapshot)?;

    let mut frames = app_state
        .sse_manager
        .open_stream(identity.subscriber_id(), initial);
    let connection_id = frames.connection_id().clone();

    let stream = stream! {
        while let Some(frame) = frames.next().await {
            yield Ok::<_, Infallible>(Event::default().data(frame));
        }
        debug!("SSE connection {connection_id} ended by the server");
    };

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        Sse::new(stream),
    ))
}

fn wire_snapshot(snapshot: &NotificationSnapshot) -> Result<Snapshot, Error> {
    let notifications = snapshot
        .notifications
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Snapshot::new(notifications, snapshot.unread_count))
}
