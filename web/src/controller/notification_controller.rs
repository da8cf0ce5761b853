use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::notification::{self as NotificationApi, NewNotification, NotificationSnapshot};
use domain::{notifications, Id};
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct MarkedRead {
    updated: u64,
}

/// GET the caller's notification snapshot
#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "The 20 most recent notifications, newest first, and the unread count", body = NotificationSnapshot),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Notification storage unavailable")
    ),
    security(
        ("bearer_auth" = []),
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET notification snapshot for user {}", identity.user_id);

    let snapshot =
        NotificationApi::snapshot(app_state.notifications.as_ref(), identity.user_id).await?;

    Ok(Json(snapshot))
}

/// CREATE a notification for any user and push it to their live streams
#[utoipa::path(
    post,
    path = "/notifications",
    request_body = NewNotification,
    responses(
        (status = 201, description = "Notification stored and pushed", body = notifications::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not produce notifications"),
        (status = 422, description = "Empty title or message"),
        (status = 503, description = "Notification storage unavailable")
    ),
    security(
        ("bearer_auth" = []),
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(new_notification): Json<NewNotification>,
) -> Result<impl IntoResponse, Error> {
    if !identity.role.can_produce_notifications() {
        warn!(
            "User {} with role {} tried to create a notification",
            identity.user_id, identity.role
        );
        return Err(Error::forbidden());
    }

    let notification = NotificationApi::notify(
        app_state.notifications.as_ref(),
        &app_state.event_publisher,
        new_notification,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), notification)),
    ))
}

/// UPDATE one of the caller's notifications to read
#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification id"),
    ),
    responses(
        (status = 200, description = "Notification marked read", body = notifications::Model),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such notification for this user")
    ),
    security(
        ("bearer_auth" = []),
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT notification {id} read for user {}", identity.user_id);

    let notification = NotificationApi::mark_as_read(
        app_state.notifications.as_ref(),
        &app_state.event_publisher,
        id,
        identity.user_id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), notification)))
}

/// UPDATE all of the caller's notifications to read
#[utoipa::path(
    put,
    path = "/notifications/read",
    responses(
        (status = 200, description = "Number of notifications marked read", body = MarkedRead),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = []),
        ("cookie_auth" = [])
    )
)]
pub async fn read_all(
    AuthenticatedUser(identity): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    let updated = NotificationApi::mark_all_as_read(
        app_state.notifications.as_ref(),
        &app_state.event_publisher,
        identity.user_id,
    )
    .await?;

    debug!("Marked {updated} notifications read for user {}", identity.user_id);

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        MarkedRead { updated },
    )))
}
