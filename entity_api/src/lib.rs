pub use entity::{notification_type, notifications, Id};

pub mod error;
pub mod notification;
