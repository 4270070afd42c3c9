// src/models/calendar.rs

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Booking,
    Maintenance,
}

impl EventKind {
    /// Cor usada pelo calendário do frontend.
    pub fn color(self) -> &'static str {
        match self {
            EventKind::Booking => "#4e73df",
            EventKind::Maintenance => "#e74a3b",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub room_id: Uuid,
    pub room_name: String,
    #[schema(example = "approved")]
    pub status: String,
    pub kind: EventKind,
    pub owner_label: Option<String>,
    pub color: String,
}

// Linhas cruas vindas do banco, uma por tabela
#[derive(Debug, Clone, FromRow)]
pub struct BookingEventRow {
    pub id: Uuid,
    pub purpose: String,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_id: Uuid,
    pub room_name: String,
    pub status: crate::models::booking::BookingStatus,
    pub requester_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct MaintenanceEventRow {
    pub id: Uuid,
    pub maintenance_type: String,
    pub maintenance_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room_id: Uuid,
    pub room_name: String,
    pub status: crate::models::maintenance::MaintenanceStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CalendarQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub room_id: Option<Uuid>,
    /// `booking` ou `maintenance`
    pub category: Option<EventKind>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarFeed {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: usize,
    pub days: BTreeMap<NaiveDate, Vec<CalendarEvent>>,
}
