// src/models/facility.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "facility_unit", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FacilityUnit {
    Piece,
    Set,
    Meter,
    Unit,
}

// Catálogo mestre
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: Uuid,
    #[schema(example = "Meja Rapat")]
    pub name: String,
    #[schema(example = "MR")]
    pub code: String,
    pub description: Option<String>,
    pub unit: FacilityUnit,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da tabela-ponte room_facilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomFacility {
    pub room_id: Uuid,
    pub facility_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

// Vínculo com os dados do catálogo (para exibição)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomFacilityEntry {
    pub facility_id: Uuid,
    pub name: String,
    pub code: String,
    pub unit: FacilityUnit,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Item pedido pelo cliente ao vincular facilidades a uma sala.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacilityAssignment {
    pub facility_id: Uuid,
    #[schema(example = 2)]
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Attach: só insere (ignora os já vinculados). Sync: substitui o conjunto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    Attach,
    Sync,
}
