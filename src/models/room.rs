// src/models/room.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::facility::RoomFacilityEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "room_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Available,
    Maintenance,
    Booked,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub building_id: Uuid,
    pub category_id: Uuid,
    #[schema(example = "TK-101")]
    pub code: String,
    #[schema(example = "Ruang Kuliah 101")]
    pub name: String,
    #[schema(example = "Lantai 1, sayap timur")]
    pub location_detail: Option<String>,
    #[schema(example = 40)]
    pub capacity: i32,
    pub description: Option<String>,
    pub status: RoomStatus,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Sala com os nomes de prédio/categoria/faculdade (listagens)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub room: Room,
    pub building_name: String,
    pub category_name: String,
    pub faculty_id: Uuid,
    pub faculty_name: String,
}

// Detalhe completo (sala + facilidades)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    #[serde(flatten)]
    pub summary: RoomSummary,
    pub facilities: Vec<RoomFacilityEntry>,
}

/// Filtros opcionais da listagem de salas.
#[derive(Debug, Default, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RoomFilter {
    pub building_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<RoomStatus>,
}

// Sala travada (FOR UPDATE) durante verificação + escrita de reservas
#[derive(Debug, Clone, FromRow)]
pub struct RoomLock {
    pub id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub faculty_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct RoomInput {
    pub building_id: Uuid,
    pub category_id: Uuid,
    pub code: String,
    pub name: String,
    pub location_detail: Option<String>,
    pub capacity: i32,
    pub description: Option<String>,
    pub status: RoomStatus,
}
