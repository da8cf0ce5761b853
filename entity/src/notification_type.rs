use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The business event a notification was raised for.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    EnumIter,
    Deserialize,
    Serialize,
    DeriveActiveEnum,
    Default,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum NotificationType {
    #[sea_orm(string_value = "feedback")]
    Feedback,
    #[sea_orm(string_value = "project_update")]
    ProjectUpdate,
    #[sea_orm(string_value = "proposal")]
    Proposal,
    #[sea_orm(string_value = "invoice")]
    Invoice,
    #[sea_orm(string_value = "lead")]
    Lead,
    #[sea_orm(string_value = "system")]
    #[default]
    System,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feedback => write!(f, "feedback"),
            Self::ProjectUpdate => write!(f, "project_update"),
            Self::Proposal => write!(f, "proposal"),
            Self::Invoice => write!(f, "invoice"),
            Self::Lead => write!(f, "lead"),
            Self::System => write!(f, "system"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn display_matches_the_stored_value() {
        for kind in NotificationType::iter() {
            assert_eq!(kind.to_string(), kind.to_value());
        }
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&NotificationType::ProjectUpdate).unwrap();
        assert_eq!(json, "\"project_update\"");
    }
}
