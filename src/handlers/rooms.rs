// src/handlers/rooms.rs

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{field_error, ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CapManageRooms, RequireCapability},
        scope::RequestScope,
    },
    models::{
        facility::FacilityAssignment,
        room::{RoomDetail, RoomFilter, RoomInput, RoomStatus, RoomSummary},
    },
};

fn default_status() -> RoomStatus {
    RoomStatus::Available
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub building_id: Uuid,
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 50, message = "validation.required"))]
    #[schema(example = "TK-101")]
    pub code: String,
    #[validate(length(min = 1, max = 150, message = "validation.name_required"))]
    #[schema(example = "Ruang Kuliah 101")]
    pub name: String,
    pub location_detail: Option<String>,
    #[validate(range(min = 1, message = "validation.capacity"))]
    #[schema(example = 40)]
    pub capacity: i32,
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: RoomStatus,
    /// Na criação: vincula. Na edição: quando presente, substitui o conjunto.
    pub facilities: Option<Vec<FacilityAssignment>>,
}

impl RoomPayload {
    fn into_parts(self) -> (RoomInput, Option<Vec<FacilityAssignment>>) {
        let input = RoomInput {
            building_id: self.building_id,
            category_id: self.category_id,
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            location_detail: self.location_detail,
            capacity: self.capacity,
            description: self.description,
            status: self.status,
        };
        (input, self.facilities)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncFacilitiesPayload {
    pub facilities: Vec<FacilityAssignment>,
}

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    params(RoomFilter),
    responses(
        (status = 200, description = "Salas visíveis no escopo", body = [RoomSummary]),
        (status = 428, description = "Selecione uma faculdade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_rooms(
    State(app_state): State<AppState>,
    locale: Locale,
    RequestScope(scope): RequestScope,
    Query(filter): Query<RoomFilter>,
) -> Result<Json<Vec<RoomSummary>>, ApiError> {
    let rooms = app_state
        .room_service
        .list_rooms(&scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(rooms))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}",
    tag = "Rooms",
    params(("room_id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Sala com facilidades", body = RoomDetail),
        (status = 404, description = "Sala não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_room(
    State(app_state): State<AppState>,
    locale: Locale,
    RequestScope(scope): RequestScope,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomDetail>, ApiError> {
    let room = app_state
        .room_service
        .get_room(&scope, room_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(room))
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Rooms",
    request_body = RoomPayload,
    responses(
        (status = 201, description = "Sala criada", body = RoomDetail),
        (status = 403, description = "Prédio fora do escopo"),
        (status = 409, description = "Código já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_room(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapManageRooms>,
    Json(payload): Json<RoomPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (input, facilities) = payload.into_parts();
    let room = app_state
        .room_service
        .create_room(&principal, &scope, input, &facilities.unwrap_or_default())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    put,
    path = "/api/rooms/{room_id}",
    tag = "Rooms",
    request_body = RoomPayload,
    params(("room_id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Sala atualizada", body = RoomDetail),
        (status = 404, description = "Sala não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_room(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapManageRooms>,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<RoomPayload>,
) -> Result<Json<RoomDetail>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let (input, facilities) = payload.into_parts();
    let room = app_state
        .room_service
        .update_room(&principal, &scope, room_id, input, facilities.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(room))
}

#[utoipa::path(
    put,
    path = "/api/rooms/{room_id}/facilities",
    tag = "Rooms",
    request_body = SyncFacilitiesPayload,
    params(("room_id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 200, description = "Facilidades sincronizadas", body = RoomDetail),
        (status = 400, description = "Quantidade inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn sync_room_facilities(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapManageRooms>,
    Path(room_id): Path<Uuid>,
    Json(payload): Json<SyncFacilitiesPayload>,
) -> Result<Json<RoomDetail>, ApiError> {
    let room = app_state
        .room_service
        .sync_facilities(&principal, &scope, room_id, &payload.facilities)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(room))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{room_id}",
    tag = "Rooms",
    params(("room_id" = Uuid, Path, description = "ID da sala")),
    responses(
        (status = 204, description = "Sala removida"),
        (status = 409, description = "Sala possui reservas")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_room(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapManageRooms>,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .room_service
        .delete_room(&principal, &scope, room_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// Upload da foto da sala (campo multipart `image`)
#[utoipa::path(
    post,
    path = "/api/rooms/{room_id}/image",
    tag = "Rooms",
    params(("room_id" = Uuid, Path, description = "ID da sala")),
    request_body(content_type = "multipart/form-data", description = "Campo `image` (jpg, jpeg, png, webp)"),
    responses(
        (status = 200, description = "Imagem atualizada", body = RoomDetail),
        (status = 400, description = "Arquivo inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_room_image(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapManageRooms>,
    Path(room_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<RoomDetail>, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);
    let malformed = || field_error("image", "invalid_value", "validation.invalid_value");

    let mut image: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|_| to_api(malformed()))? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|_| to_api(malformed()))?;
        image = Some((filename, bytes.to_vec()));
    }

    let (filename, bytes) =
        image.ok_or_else(|| to_api(field_error("image", "required", "validation.required")))?;

    let room = app_state
        .room_service
        .set_room_image(&principal, &scope, room_id, &filename, &bytes)
        .await
        .map_err(to_api)?;

    Ok(Json(room))
}
