//! Business rules for real-time notifications.
//!
//! `web` depends on this crate rather than on `entity_api` directly; the
//! re-exports below are the entity types it needs.

pub use entity_api::{notification_type, notifications, Id};
pub use entity::roles;

pub mod auth;
pub mod error;
pub mod notification;
