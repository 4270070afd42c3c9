// src/handlers/maintenance.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CapManageRooms, RequireCapability},
        scope::RequestScope,
    },
    models::maintenance::{MaintenanceLog, MaintenanceStatus, NewMaintenance},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaintenancePayload {
    pub room_id: Uuid,
    pub maintenance_date: NaiveDate,
    #[schema(value_type = String, example = "13:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "15:00:00")]
    pub end_time: NaiveTime,
    #[validate(length(min = 1, max = 150, message = "validation.required"))]
    #[schema(example = "Servis AC")]
    pub maintenance_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaintenanceStatusPayload {
    pub status: MaintenanceStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MaintenanceQuery {
    pub room_id: Option<Uuid>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[utoipa::path(
    post,
    path = "/api/maintenance",
    tag = "Maintenance",
    request_body = CreateMaintenancePayload,
    responses(
        (status = 201, description = "Manutenção registrada", body = MaintenanceLog),
        (status = 400, description = "Janela inválida"),
        (status = 403, description = "Sala fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_maintenance(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapManageRooms>,
    Json(payload): Json<CreateMaintenancePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let entry = NewMaintenance {
        room_id: payload.room_id,
        maintenance_date: payload.maintenance_date,
        start_time: payload.start_time,
        end_time: payload.end_time,
        maintenance_type: payload.maintenance_type.trim().to_string(),
        notes: payload.notes,
    };

    let log = app_state
        .maintenance_service
        .create(&principal, &scope, entry)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(log)))
}

#[utoipa::path(
    get,
    path = "/api/maintenance",
    tag = "Maintenance",
    params(MaintenanceQuery),
    responses((status = 200, description = "Registros de manutenção", body = [MaintenanceLog])),
    security(("api_jwt" = []))
)]
pub async fn list_maintenance(
    State(app_state): State<AppState>,
    locale: Locale,
    RequestScope(scope): RequestScope,
    Query(query): Query<MaintenanceQuery>,
) -> Result<Json<Vec<MaintenanceLog>>, ApiError> {
    let logs = app_state
        .maintenance_service
        .list(&scope, query.room_id, query.start, query.end)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(logs))
}

#[utoipa::path(
    patch,
    path = "/api/maintenance/{maintenance_id}/status",
    tag = "Maintenance",
    request_body = UpdateMaintenanceStatusPayload,
    params(("maintenance_id" = Uuid, Path, description = "ID do registro")),
    responses(
        (status = 200, description = "Status atualizado", body = MaintenanceLog),
        (status = 404, description = "Registro não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_maintenance_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapManageRooms>,
    Path(maintenance_id): Path<Uuid>,
    Json(payload): Json<UpdateMaintenanceStatusPayload>,
) -> Result<Json<MaintenanceLog>, ApiError> {
    let log = app_state
        .maintenance_service
        .update_status(&principal, &scope, maintenance_id, payload.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(log))
}
