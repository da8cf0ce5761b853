use crate::{
    controller::{health_check_controller, notification_controller, stream_stats_controller},
    sse::handler,
    AppState,
};
use axum::{
    routing::{get, put},
    Router,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Freelance Platform Notifications API"
        ),
        paths(
            health_check_controller::health_check,
            notification_controller::index,
            notification_controller::create,
            notification_controller::read,
            notification_controller::read_all,
            stream_stats_controller::stats,
            handler::sse_handler,
        ),
        components(
            schemas(
                domain::notifications::Model,
                domain::notification_type::NotificationType,
                domain::notification::NotificationSnapshot,
                domain::notification::NewNotification,
                notification_controller::MarkedRead,
                stream_stats_controller::StreamStats,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "freelance_platform", description = "Real-time notifications for the Freelance Platform")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Session tokens are accepted either as a bearer token or in the session cookie.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "token",
                    "Session token issued by the auth service",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(notification_routes(app_state.clone()))
        .merge(sse_routes(app_state))
        // **** FIXME: protect the OpenAPI web UI
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

// Authentication happens in each handler's `AuthenticatedUser` extractor.
fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/notifications",
            get(notification_controller::index).post(notification_controller::create),
        )
        .route("/notifications/read", put(notification_controller::read_all))
        .route(
            "/notifications/{id}/read",
            put(notification_controller::read),
        )
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/notifications/stream", get(handler::sse_handler))
        .route(
            "/notifications/stream/stats",
            get(stream_stats_controller::stats),
        )
        .with_state(app_state)
}
