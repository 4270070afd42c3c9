// src/models/maintenance.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceStatus::Scheduled => "scheduled",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
            MaintenanceStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceLog {
    pub id: Uuid,
    pub room_id: Uuid,
    pub maintenance_date: NaiveDate,
    #[schema(value_type = String, example = "13:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "15:00:00")]
    pub end_time: NaiveTime,
    #[schema(example = "Servis AC")]
    pub maintenance_type: String,
    pub notes: Option<String>,
    pub status: MaintenanceStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub room_id: Uuid,
    pub maintenance_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub maintenance_type: String,
    pub notes: Option<String>,
}
