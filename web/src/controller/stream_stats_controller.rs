use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use axum::{extract::State, response::IntoResponse, Json};
use domain::roles::Role;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StreamStats {
    /// Open streams across all users of this process.
    total_connections: usize,
    /// Open streams of the caller.
    connections: usize,
}

/// GET live stream counts for this process
#[utoipa::path(
    get,
    path = "/notifications/stream/stats",
    responses(
        (status = 200, description = "Open stream counts", body = StreamStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(
        ("bearer_auth" = []),
        ("cookie_auth" = [])
    )
)]
pub async fn stats(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    if identity.role != Role::Admin {
        return Err(Error::forbidden());
    }

    Ok(Json(StreamStats {
        total_connections: app_state.sse_manager.total_connections(),
        connections: app_state
            .sse_manager
            .connection_count(&identity.subscriber_id()),
    }))
}
