use domain::auth::JwtAuthenticator;
use domain::notification::DbNotificationRepository;
use events::EventPublisher;
use log::*;
use service::{config::Config, logging::Logger};
use sse::domain_event_handler::SseDomainEventHandler;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!("Starting up notification service...");

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            process::exit(1);
        }
    };

    let authenticator = match JwtAuthenticator::from_config(&config) {
        Ok(authenticator) => Arc::new(authenticator),
        Err(e) => {
            error!("Failed to configure session authentication: {e}");
            process::exit(1);
        }
    };

    let sse_manager = Arc::new(sse::Manager::new(config.heartbeat_interval()));
    info!(
        "Notification streams send a heartbeat every {}s",
        sse_manager.heartbeat_interval().as_secs()
    );

    // Every published domain event is fanned out to the owner's open streams
    let event_publisher = EventPublisher::new()
        .with_handler(Arc::new(SseDomainEventHandler::new(Arc::clone(&sse_manager))));

    let notifications = Arc::new(DbNotificationRepository::new(Arc::clone(&db)));

    let app_state = web::AppState::new(
        config,
        sse_manager,
        event_publisher,
        notifications,
        authenticator,
    );

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
        process::exit(1);
    }
}
