// src/handlers/bookings.rs

use std::{collections::HashMap, str::FromStr};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
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
        rbac::{CapApproveBooking, CapSubmitBooking, RequireCapability},
        scope::RequestScope,
    },
    models::booking::{
        BookingDetail, BookingListFilter, BookingSummary, DocumentKind, DocumentType, NewBooking, UploadedDocument,
    },
};

// ---
// Payloads
// ---
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBookingPayload {
    #[validate(length(max = 1000, message = "validation.notes_required"))]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectBookingPayload {
    #[validate(length(min = 1, max = 1000, message = "validation.notes_required"))]
    #[schema(example = "Ruangan dipakai untuk ujian")]
    pub admin_notes: String,
}

/// Documentação do formulário multipart de `POST /api/bookings`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SubmitBookingForm {
    room_id: Uuid,
    #[schema(example = "2025-06-01")]
    booking_date: String,
    #[schema(example = "09:00")]
    start_time: String,
    #[schema(example = "11:00")]
    end_time: String,
    purpose: String,
    number_of_participants: i32,
    #[schema(value_type = String, format = Binary)]
    permit_letter: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    proposal: Option<Vec<u8>>,
    #[schema(value_type = Option<String>, format = Binary)]
    attendance_list: Option<Vec<u8>>,
}

// ---
// Leitura do multipart
// ---
fn required_text<'a>(fields: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str, AppError> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| field_error(name, "required", "validation.required"))
}

fn parse_text<T: FromStr>(fields: &HashMap<String, String>, name: &'static str) -> Result<T, AppError> {
    required_text(fields, name)?
        .parse::<T>()
        .map_err(|_| field_error(name, "invalid_value", "validation.invalid_value"))
}

/// Aceita `HH:MM` e `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

fn parse_time_field(fields: &HashMap<String, String>, name: &'static str) -> Result<NaiveTime, AppError> {
    parse_time(required_text(fields, name)?)
        .ok_or_else(|| field_error(name, "invalid_value", "validation.invalid_value"))
}

pub fn booking_from_fields(fields: &HashMap<String, String>) -> Result<NewBooking, AppError> {
    Ok(NewBooking {
        room_id: parse_text::<Uuid>(fields, "room_id")?,
        booking_date: parse_text::<NaiveDate>(fields, "booking_date")?,
        start_time: parse_time_field(fields, "start_time")?,
        end_time: parse_time_field(fields, "end_time")?,
        purpose: required_text(fields, "purpose")
            .map_err(|_| field_error("purpose", "required", "validation.purpose_required"))?
            .to_string(),
        number_of_participants: parse_text::<i32>(fields, "number_of_participants")?,
    })
}

async fn read_submission(mut multipart: Multipart) -> Result<(NewBooking, Vec<UploadedDocument>), AppError> {
    let malformed = || field_error("body", "invalid_value", "validation.invalid_value");

    let mut fields: HashMap<String, String> = HashMap::new();
    let mut documents: Vec<UploadedDocument> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|_| malformed())? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(kind) = DocumentKind::from_field(&name) {
            let original_filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|_| malformed())?;
            // Campo de arquivo enviado vazio = não enviado
            if original_filename.is_empty() && bytes.is_empty() {
                continue;
            }
            documents.push(UploadedDocument { kind, original_filename, bytes: bytes.to_vec() });
        } else {
            let value = field.text().await.map_err(|_| malformed())?;
            fields.insert(name, value);
        }
    }

    Ok((booking_from_fields(&fields)?, documents))
}

// ---
// Handlers
// ---
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body(content = SubmitBookingForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Solicitação criada (pending)", body = BookingDetail),
        (status = 400, description = "Dados ou documentos inválidos"),
        (status = 404, description = "Sala não encontrada"),
        (status = 409, description = "Horário já ocupado")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapSubmitBooking>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let (booking, documents) = read_submission(multipart).await.map_err(to_api)?;

    let created = app_state
        .booking_service
        .submit(&principal, &scope, booking, documents)
        .await
        .map_err(to_api)?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/bookings/mine",
    tag = "Bookings",
    params(BookingListFilter),
    responses((status = 200, description = "Reservas do usuário", body = [BookingSummary])),
    security(("api_jwt" = []))
)]
pub async fn list_my_bookings(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(filter): Query<BookingListFilter>,
) -> Result<Json<Vec<BookingSummary>>, ApiError> {
    let bookings = app_state
        .booking_service
        .list_mine(&principal, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(bookings))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    params(BookingListFilter),
    responses(
        (status = 200, description = "Reservas no escopo do revisor", body = [BookingSummary]),
        (status = 428, description = "Selecione uma faculdade")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_bookings(
    State(app_state): State<AppState>,
    locale: Locale,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapApproveBooking>,
    Query(filter): Query<BookingListFilter>,
) -> Result<Json<Vec<BookingSummary>>, ApiError> {
    let bookings = app_state
        .booking_service
        .list_scoped(&scope, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(bookings))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{booking_id}",
    tag = "Bookings",
    params(("booking_id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva com documentos", body = BookingDetail),
        (status = 403, description = "Sem acesso a esta reserva"),
        (status = 404, description = "Reserva não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetail>, ApiError> {
    let booking = app_state
        .booking_service
        .get(&principal, &scope, booking_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{booking_id}/approve",
    tag = "Bookings",
    request_body = ApproveBookingPayload,
    params(("booking_id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva aprovada", body = BookingDetail),
        (status = 404, description = "Reserva não encontrada"),
        (status = 409, description = "Conflito com reserva aprovada ou reserva já processada")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapApproveBooking>,
    Path(booking_id): Path<Uuid>,
    payload: Option<Json<ApproveBookingPayload>>,
) -> Result<Json<BookingDetail>, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let booking = app_state
        .booking_service
        .approve(&principal, &scope, booking_id, payload.admin_notes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{booking_id}/reject",
    tag = "Bookings",
    request_body = RejectBookingPayload,
    params(("booking_id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva rejeitada", body = BookingDetail),
        (status = 400, description = "Observação obrigatória"),
        (status = 409, description = "Reserva já processada")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(principal): AuthenticatedUser,
    RequestScope(scope): RequestScope,
    _guard: RequireCapability<CapApproveBooking>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<RejectBookingPayload>,
) -> Result<Json<BookingDetail>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let booking = app_state
        .booking_service
        .reject(&principal, &scope, booking_id, &payload.admin_notes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(booking))
}

#[utoipa::path(
    get,
    path = "/api/document-types",
    tag = "Bookings",
    responses((status = 200, description = "Tipos de documento aceitos", body = [DocumentType])),
    security(("api_jwt" = []))
)]
pub async fn list_document_types(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<DocumentType>>, ApiError> {
    let types = app_state
        .booking_service
        .document_types()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(types))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn times_accept_minutes_or_seconds() {
        assert_eq!(parse_time("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_time("13:30:15"), NaiveTime::from_hms_opt(13, 30, 15));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("jam sembilan"), None);
    }

    #[test]
    fn builds_booking_from_form_fields() {
        let room = Uuid::new_v4();
        let room_id = room.to_string();
        let fields = form(&[
            ("room_id", room_id.as_str()),
            ("booking_date", "2025-06-01"),
            ("start_time", "09:00"),
            ("end_time", "11:00"),
            ("purpose", "  Seminar  "),
            ("number_of_participants", "35"),
        ]);

        let booking = booking_from_fields(&fields).unwrap();
        assert_eq!(booking.room_id, room);
        assert_eq!(booking.purpose, "Seminar");
        assert_eq!(booking.number_of_participants, 35);
    }

    #[test]
    fn missing_or_malformed_fields_are_validation_errors() {
        let fields = form(&[("room_id", "bukan-uuid")]);
        match booking_from_fields(&fields) {
            Err(AppError::ValidationError(e)) => assert!(e.field_errors().contains_key("room_id")),
            other => panic!("esperava ValidationError, veio {other:?}"),
        }

        let other_room = Uuid::new_v4().to_string();
        let fields = form(&[
            ("room_id", other_room.as_str()),
            ("booking_date", "2025-06-01"),
            ("start_time", "09:00"),
            ("end_time", "11:00"),
            ("number_of_participants", "10"),
        ]);
        match booking_from_fields(&fields) {
            Err(AppError::ValidationError(e)) => assert!(e.field_errors().contains_key("purpose")),
            other => panic!("esperava ValidationError, veio {other:?}"),
        }
    }
}
