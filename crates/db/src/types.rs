use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[ts(use_ts_enum)]
pub enum TaskStatus {
    #[default]
    #[sea_orm(string_value = "Pendiente")]
    #[serde(rename = "Pendiente")]
    #[strum(serialize = "Pendiente")]
    Pending,
    #[sea_orm(string_value = "En Progreso")]
    #[serde(rename = "En Progreso")]
    #[strum(serialize = "En Progreso")]
    InProgress,
    #[sea_orm(string_value = "Completada")]
    #[serde(rename = "Completada")]
    #[strum(serialize = "Completada")]
    Completed,
    #[sea_orm(string_value = "Bloqueada")]
    #[serde(rename = "Bloqueada")]
    #[strum(serialize = "Bloqueada")]
    Blocked,
    #[sea_orm(string_value = "Cancelada")]
    #[serde(rename = "Cancelada")]
    #[strum(serialize = "Cancelada")]
    Cancelled,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[ts(use_ts_enum)]
pub enum TaskPriority {
    #[sea_orm(string_value = "Baja")]
    #[serde(rename = "Baja")]
    #[strum(serialize = "Baja")]
    Low,
    #[default]
    #[sea_orm(string_value = "Media")]
    #[serde(rename = "Media")]
    #[strum(serialize = "Media")]
    Medium,
    #[sea_orm(string_value = "Alta")]
    #[serde(rename = "Alta")]
    #[strum(serialize = "Alta")]
    High,
    #[sea_orm(string_value = "Crítica")]
    #[serde(rename = "Crítica")]
    #[strum(serialize = "Crítica")]
    Critical,
}

impl TaskPriority {
    pub fn is_high(&self) -> bool {
        matches!(self, TaskPriority::High | TaskPriority::Critical)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[ts(use_ts_enum)]
pub enum HistoryAction {
    #[sea_orm(string_value = "CREATED")]
    Created,
    #[sea_orm(string_value = "STATUS_CHANGED")]
    StatusChanged,
    #[sea_orm(string_value = "TITLE_CHANGED")]
    TitleChanged,
    #[sea_orm(string_value = "DELETED")]
    Deleted,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    #[sea_orm(string_value = "task_assigned")]
    TaskAssigned,
    #[sea_orm(string_value = "task_updated")]
    TaskUpdated,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn task_status_uses_spanish_labels() {
        assert_eq!(TaskStatus::InProgress.to_string(), "En Progreso");
        assert_eq!(
            TaskStatus::from_str("Completada").unwrap(),
            TaskStatus::Completed
        );
        assert!(TaskStatus::from_str("done").is_err());
        assert_eq!(
            serde_json::to_string(&TaskStatus::Blocked).unwrap(),
            "\"Bloqueada\""
        );
    }

    #[test]
    fn task_priority_defaults_to_medium() {
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
        assert_eq!(TaskPriority::from_str("Crítica").unwrap(), TaskPriority::Critical);
        assert!(TaskPriority::Critical.is_high());
        assert!(!TaskPriority::Medium.is_high());
    }

    #[test]
    fn history_action_tags_are_screaming_snake_case() {
        assert_eq!(HistoryAction::StatusChanged.to_string(), "STATUS_CHANGED");
        assert_eq!(
            serde_json::to_string(&HistoryAction::TitleChanged).unwrap(),
            "\"TITLE_CHANGED\""
        );
        assert_eq!(NotificationKind::TaskAssigned.to_string(), "task_assigned");
    }
}
