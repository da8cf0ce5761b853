use serde::{Deserialize, Serialize};

/// Role carried in a verified session credential.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    /// Internal services allowed to produce notifications on behalf of users.
    System,
}

impl Role {
    /// Whether this role may create notifications for other users.
    pub fn can_produce_notifications(&self) -> bool {
        matches!(self, Role::Admin | Role::System)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(fmt, "user"),
            Role::Admin => write!(fmt, "admin"),
            Role::System => write!(fmt, "system"),
        }
    }
}
