// src/handlers/calendar.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, scope::RequestScope},
    models::calendar::{CalendarFeed, CalendarQuery},
};

#[utoipa::path(
    get,
    path = "/api/calendar/events",
    tag = "Calendar",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Reservas e manutenções agrupadas por dia", body = CalendarFeed),
        (status = 400, description = "Intervalo de datas inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_events(
    State(app_state): State<AppState>,
    locale: Locale,
    RequestScope(scope): RequestScope,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarFeed>, ApiError> {
    let feed = app_state
        .calendar_service
        .list_events(&scope, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(feed))
}
