//! Seeds a development database with sample notifications for one user and
//! prints a session token for that user.
//!
//! Set `SEED_USER_ID` to reuse an existing user id; otherwise a new one is generated.

use domain::auth::{issue_token, Identity};
use domain::notification::{self, DbNotificationRepository, Trigger};
use domain::roles::Role;
use events::EventPublisher;
use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!("Seeding database [{}]...", config.database_url());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let user_id = match std::env::var("SEED_USER_ID") {
        Ok(raw) => match Uuid::parse_str(&raw) {
            Ok(id) => id,
            Err(e) => {
                error!("SEED_USER_ID is not a valid UUID: {e}");
                std::process::exit(1);
            }
        },
        Err(_) => Uuid::new_v4(),
    };

    let repository = DbNotificationRepository::new(db);
    // Nothing is listening while seeding
    let publisher = EventPublisher::new();

    for trigger in sample_triggers() {
        match notification::notify_trigger(&repository, &publisher, user_id, trigger).await {
            Ok(created) => info!("Created notification {} ({})", created.id, created.title),
            Err(e) => {
                error!("Failed to seed notification: {e}");
                std::process::exit(1);
            }
        }
    }

    info!("Seeded notifications for user {user_id}");

    if let Some(secret) = config.jwt_secret() {
        let identity = Identity {
            user_id,
            role: Role::User,
        };
        match issue_token(&secret, &identity, TOKEN_TTL) {
            Ok(token) => println!("{token}"),
            Err(e) => error!("Failed to issue a session token: {e}"),
        }
    } else {
        info!("No JWT secret configured; skipping session token");
    }
}

fn sample_triggers() -> Vec<Trigger> {
    vec![
        Trigger::LeadCaptured {
            lead_id: Uuid::new_v4(),
            lead_name: "Dana Whitfield".to_string(),
            source: "website".to_string(),
        },
        Trigger::ProposalAccepted {
            proposal_id: Uuid::new_v4(),
            proposal_title: "Brand refresh".to_string(),
            client_name: "Northwind".to_string(),
        },
        Trigger::ProjectUpdated {
            project_id: Uuid::new_v4(),
            project_name: "Brand refresh".to_string(),
            status: "in progress".to_string(),
        },
        Trigger::FeedbackReceived {
            project_id: Uuid::new_v4(),
            project_name: "Brand refresh".to_string(),
            client_name: "Northwind".to_string(),
        },
        Trigger::InvoicePaid {
            invoice_id: Uuid::new_v4(),
            invoice_number: "INV-0042".to_string(),
            amount: "$2,400.00".to_string(),
        },
    ]
}
