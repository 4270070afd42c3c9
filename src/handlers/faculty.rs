// src/handlers/faculty.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CapBypassScope, CapManageRooms, CapSelectFaculty, RequireCapability},
        scope::RequestScope,
    },
    models::faculty::{Building, Faculty, FacultySelectionView, RoomCategory},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectFacultyPayload {
    pub faculty_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNamedPayload {
    #[validate(length(min = 1, max = 150, message = "validation.name_required"))]
    #[schema(example = "Fakultas Teknik")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildingPayload {
    pub faculty_id: Uuid,
    #[validate(length(min = 1, max = 150, message = "validation.name_required"))]
    #[schema(example = "Gedung A")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantFacultyPayload {
    pub faculty_id: Uuid,
}

// ---
// Seleção de faculdade
// ---
#[utoipa::path(
    get,
    path = "/api/faculty-selection",
    tag = "Faculty Scope",
    responses(
        (status = 200, description = "Seleção atual e faculdades disponíveis", body = FacultySelectionView)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_selection(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
) -> Result<Json<FacultySelectionView>, ApiError> {
    let view = app_state
        .scope_service
        .selection_view(&principal, &scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/faculty-selection",
    tag = "Faculty Scope",
    request_body = SelectFacultyPayload,
    responses(
        (status = 200, description = "Faculdade selecionada", body = FacultySelectionView),
        (status = 403, description = "Faculdade não liberada para o usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn select_faculty(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    _guard: RequireCapability<CapSelectFaculty>,
    Json(payload): Json<SelectFacultyPayload>,
) -> Result<Json<FacultySelectionView>, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    app_state
        .scope_service
        .select_faculty(&principal, payload.faculty_id)
        .await
        .map_err(to_api)?;

    // Devolve o estado já resolvido com a nova seleção
    let scope = app_state.scope_service.resolve(&principal).await.map_err(to_api)?;
    let view = app_state
        .scope_service
        .selection_view(&principal, &scope)
        .await
        .map_err(to_api)?;

    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/api/faculty-selection",
    tag = "Faculty Scope",
    responses((status = 204, description = "Seleção removida")),
    security(("api_jwt" = []))
)]
pub async fn clear_selection(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    app_state
        .scope_service
        .clear_selection(&principal)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Acesso às faculdades (Super Admin)
// ---
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/faculties",
    tag = "Faculty Scope",
    request_body = GrantFacultyPayload,
    params(("user_id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Acesso concedido"),
        (status = 404, description = "Usuário ou faculdade não encontrados")
    ),
    security(("api_jwt" = []))
)]
pub async fn grant_faculty(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapBypassScope>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<GrantFacultyPayload>,
) -> Result<StatusCode, ApiError> {
    app_state
        .scope_service
        .grant_faculty(user_id, payload.faculty_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/faculties/{faculty_id}",
    tag = "Faculty Scope",
    params(
        ("user_id" = Uuid, Path, description = "ID do usuário"),
        ("faculty_id" = Uuid, Path, description = "ID da faculdade")
    ),
    responses(
        (status = 204, description = "Acesso revogado"),
        (status = 404, description = "Vínculo inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn revoke_faculty(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapBypassScope>,
    Path((user_id, faculty_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .scope_service
        .revoke_faculty(user_id, faculty_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Faculdades
// ---
#[utoipa::path(
    get,
    path = "/api/faculties",
    tag = "Faculties",
    responses((status = 200, description = "Lista de faculdades", body = [Faculty])),
    security(("api_jwt" = []))
)]
pub async fn list_faculties(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<Faculty>>, ApiError> {
    let faculties = app_state
        .faculty_service
        .list_faculties()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(faculties))
}

#[utoipa::path(
    post,
    path = "/api/faculties",
    tag = "Faculties",
    request_body = CreateNamedPayload,
    responses(
        (status = 201, description = "Faculdade criada", body = Faculty),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_faculty(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapBypassScope>,
    Json(payload): Json<CreateNamedPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let faculty = app_state
        .faculty_service
        .create_faculty(&payload.name, payload.description.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(faculty)))
}

// ---
// Prédios
// ---
#[utoipa::path(
    get,
    path = "/api/buildings",
    tag = "Faculties",
    responses(
        (status = 200, description = "Prédios no escopo do usuário", body = [Building]),
        (status = 428, description = "Selecione uma faculdade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_buildings(
    State(app_state): State<AppState>,
    locale: Locale,
    RequestScope(scope): RequestScope,
) -> Result<Json<Vec<Building>>, ApiError> {
    let buildings = app_state
        .faculty_service
        .list_buildings(&scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(buildings))
}

#[utoipa::path(
    post,
    path = "/api/buildings",
    tag = "Faculties",
    request_body = CreateBuildingPayload,
    responses(
        (status = 201, description = "Prédio criado", body = Building),
        (status = 403, description = "Faculdade fora do escopo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_building(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapManageRooms>,
    Json(payload): Json<CreateBuildingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let building = app_state
        .faculty_service
        .create_building(
            &principal,
            &scope,
            payload.faculty_id,
            &payload.name,
            payload.description.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(building)))
}

// ---
// Categorias de sala
// ---
#[utoipa::path(
    get,
    path = "/api/room-categories",
    tag = "Faculties",
    responses((status = 200, description = "Categorias de sala", body = [RoomCategory])),
    security(("api_jwt" = []))
)]
pub async fn list_room_categories(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<RoomCategory>>, ApiError> {
    let categories = app_state
        .faculty_service
        .list_room_categories()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/room-categories",
    tag = "Faculties",
    request_body = CreateNamedPayload,
    responses((status = 201, description = "Categoria criada", body = RoomCategory)),
    security(("api_jwt" = []))
)]
pub async fn create_room_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapManageRooms>,
    Json(payload): Json<CreateNamedPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .faculty_service
        .create_room_category(&payload.name, payload.description.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}
