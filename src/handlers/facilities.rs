// src/handlers/facilities.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{CapManageRooms, RequireCapability},
    },
    models::facility::{Facility, FacilityUnit},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FacilityListQuery {
    /// Inclui facilidades desativadas
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFacilityPayload {
    #[validate(length(min = 1, max = 150, message = "validation.name_required"))]
    #[schema(example = "Kursi Lipat")]
    pub name: String,
    pub description: Option<String>,
    /// Se omitida, é inferida pelo nome
    pub unit: Option<FacilityUnit>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFacilityPayload {
    #[validate(length(min = 1, max = 150, message = "validation.name_required"))]
    pub name: String,
    pub description: Option<String>,
    pub unit: FacilityUnit,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnsureFacilityPayload {
    #[validate(length(min = 1, max = 150, message = "validation.name_required"))]
    #[schema(example = "Proyektor")]
    pub name: String,
}

#[utoipa::path(
    get,
    path = "/api/facilities",
    tag = "Facilities",
    params(FacilityListQuery),
    responses((status = 200, description = "Catálogo de facilidades", body = [Facility])),
    security(("api_jwt" = []))
)]
pub async fn list_facilities(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<FacilityListQuery>,
) -> Result<Json<Vec<Facility>>, ApiError> {
    let facilities = app_state
        .facility_service
        .list_facilities(query.include_inactive)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(facilities))
}

#[utoipa::path(
    post,
    path = "/api/facilities",
    tag = "Facilities",
    request_body = CreateFacilityPayload,
    responses(
        (status = 201, description = "Facilidade criada com código gerado", body = Facility),
        (status = 409, description = "Nome já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_facility(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapManageRooms>,
    Json(payload): Json<CreateFacilityPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let facility = app_state
        .facility_service
        .create_facility(&payload.name, payload.description.as_deref(), payload.unit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(facility)))
}

// Busca pelo nome exato ou cria (idempotente)
#[utoipa::path(
    post,
    path = "/api/facilities/ensure",
    tag = "Facilities",
    request_body = EnsureFacilityPayload,
    responses((status = 200, description = "Facilidade existente ou recém-criada", body = Facility)),
    security(("api_jwt" = []))
)]
pub async fn ensure_facility(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapManageRooms>,
    Json(payload): Json<EnsureFacilityPayload>,
) -> Result<Json<Facility>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let facility = app_state
        .facility_service
        .ensure_facility(&payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(facility))
}

#[utoipa::path(
    put,
    path = "/api/facilities/{facility_id}",
    tag = "Facilities",
    request_body = UpdateFacilityPayload,
    params(("facility_id" = Uuid, Path, description = "ID da facilidade")),
    responses(
        (status = 200, description = "Facilidade atualizada", body = Facility),
        (status = 404, description = "Facilidade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_facility(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapManageRooms>,
    Path(facility_id): Path<Uuid>,
    Json(payload): Json<UpdateFacilityPayload>,
) -> Result<Json<Facility>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let facility = app_state
        .facility_service
        .update_facility(
            facility_id,
            &payload.name,
            payload.description.as_deref(),
            payload.unit,
            payload.is_active,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(facility))
}
