//! HTTP surface of the notification service.

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use domain::auth::Authenticator;
use domain::notification::NotificationRepository;
use events::EventPublisher;
use log::*;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod extractors;
mod router;
mod sse;

pub use error::{Error, Result};

/// Everything a request handler needs.
///
/// Collaborators are held behind trait objects so tests can swap in
/// in-memory persistence and their own token verification.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sse_manager: Arc<::sse::Manager>,
    pub event_publisher: EventPublisher,
    pub notifications: Arc<dyn NotificationRepository>,
    pub authenticator: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(
        config: Config,
        sse_manager: Arc<::sse::Manager>,
        event_publisher: EventPublisher,
        notifications: Arc<dyn NotificationRepository>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            config,
            sse_manager,
            event_publisher,
            notifications,
            authenticator,
        }
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{interface}:{}", app_state.config.port);
    let listener = TcpListener::bind(&server_url).await?;

    info!("Server starting... listening for connections on http://{server_url}");

    let cors_layer = cors_layer(&app_state.config);
    let app = router::define_routes(app_state).layer(cors_layer);

    axum::serve(listener, app).await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_origin(origins)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use domain::auth::{issue_token, Identity, JwtAuthenticator};
    use domain::notification::InMemoryNotificationRepository;
    use domain::roles::Role;
    use domain::Id;
    use std::time::Duration;

    pub(crate) const SECRET: &str = "web-test-secret";

    pub(crate) struct TestApp {
        pub(crate) state: AppState,
        pub(crate) repository: Arc<InMemoryNotificationRepository>,
    }

    pub(crate) fn test_app() -> TestApp {
        let config =
            Config::from_args(["freelance_platform_rs", "--jwt-secret", SECRET]).unwrap();
        let sse_manager = Arc::new(::sse::Manager::default());
        let event_publisher = EventPublisher::new().with_handler(Arc::new(
            ::sse::domain_event_handler::SseDomainEventHandler::new(sse_manager.clone()),
        ));
        let repository = Arc::new(InMemoryNotificationRepository::new());

        TestApp {
            state: AppState::new(
                config,
                sse_manager,
                event_publisher,
                repository.clone(),
                Arc::new(JwtAuthenticator::new(SECRET)),
            ),
            repository,
        }
    }

    pub(crate) fn token_for(role: Role) -> (Id, String) {
        let identity = Identity {
            user_id: Id::new_v4(),
            role,
        };
        let token = issue_token(SECRET, &identity, Duration::from_secs(3600)).unwrap();
        (identity.user_id, token)
    }
}
