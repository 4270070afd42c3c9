// src/db/booking_repo.rs

use chrono::{NaiveDate, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::booking::{
        BookedSlot, Booking, BookingDocument, BookingListFilter, BookingStatus, BookingSummary, DocumentType,
        NewBooking,
    },
};

// Reserva + sala + solicitante + faculdade dona da sala
const BOOKING_SUMMARY_SELECT: &str = r#"
    SELECT bk.id, bk.user_id, bk.room_id, bk.booking_date, bk.start_time, bk.end_time,
           bk.purpose, bk.number_of_participants, bk.status, bk.reviewed_by, bk.reviewed_at,
           bk.admin_notes, bk.created_at, bk.updated_at,
           r.code AS room_code, r.name AS room_name,
           u.name AS requester_name, b.faculty_id
    FROM bookings bk
    JOIN rooms r ON r.id = bk.room_id
    JOIN buildings b ON b.id = r.building_id
    JOIN users u ON u.id = bk.user_id
"#;

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Verificação de conflitos
    // ---

    /// Reservas da sala no dia com os status informados.
    pub async fn slots_for_room_date<'e, E>(
        &self,
        executor: E,
        room_id: Uuid,
        date: NaiveDate,
        statuses: &[BookingStatus],
    ) -> Result<Vec<BookedSlot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();

        let slots = sqlx::query_as::<_, BookedSlot>(
            r#"
            SELECT id, start_time, end_time, status
            FROM bookings
            WHERE room_id = $1
              AND booking_date = $2
              AND status::text = ANY($3)
            ORDER BY start_time
            "#,
        )
        .bind(room_id)
        .bind(date)
        .bind(statuses)
        .fetch_all(executor)
        .await?;
        Ok(slots)
    }

    // ---
    // Escrita
    // ---

    pub async fn insert<'e, E>(&self, executor: E, user_id: Uuid, booking: &NewBooking) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                user_id, room_id, booking_date, start_time, end_time,
                purpose, number_of_participants, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(booking.room_id)
        .bind(booking.booking_date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(&booking.purpose)
        .bind(booking.number_of_participants)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }

    pub async fn document_type_id<'e, E>(&self, executor: E, slug: &str) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM document_types WHERE slug = $1")
            .bind(slug)
            .fetch_optional(executor)
            .await?;
        Ok(id)
    }

    pub async fn insert_document<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
        document_type_id: Uuid,
        file_path: &str,
        original_filename: &str,
    ) -> Result<BookingDocument, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, BookingDocument>(
            r#"
            INSERT INTO booking_documents (booking_id, document_type_id, file_path, original_filename)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(document_type_id)
        .bind(file_path)
        .bind(original_filename)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }

    /// Trava a reserva para a transição de status.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(booking)
    }

    /// Grava a decisão. A exclusion constraint é a última barreira contra
    /// duas aprovadas sobrepostas (vira `SchedulingConflict`).
    pub async fn record_review<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: BookingStatus,
        reviewer_id: Uuid,
        admin_notes: Option<&str>,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, reviewed_by = $3, reviewed_at = $4, admin_notes = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(reviewer_id)
        .bind(Utc::now())
        .bind(admin_notes)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }

    // ---
    // Leitura
    // ---

    pub async fn find_summary<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<BookingSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, BookingSummary>(&format!("{BOOKING_SUMMARY_SELECT} WHERE bk.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(booking)
    }

    pub async fn list_for_user(&self, user_id: Uuid, filter: &BookingListFilter) -> Result<Vec<BookingSummary>, AppError> {
        let bookings = sqlx::query_as::<_, BookingSummary>(&format!(
            r#"{BOOKING_SUMMARY_SELECT}
            WHERE bk.user_id = $1
              AND ($2::booking_status IS NULL OR bk.status = $2)
              AND ($3::uuid IS NULL OR bk.room_id = $3)
              AND ($4::date IS NULL OR bk.booking_date = $4)
            ORDER BY bk.booking_date DESC, bk.start_time DESC
            "#
        ))
        .bind(user_id)
        .bind(filter.status)
        .bind(filter.room_id)
        .bind(filter.date)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// `faculty_id = None` lista todas as faculdades.
    pub async fn list_scoped(
        &self,
        faculty_id: Option<Uuid>,
        filter: &BookingListFilter,
    ) -> Result<Vec<BookingSummary>, AppError> {
        let bookings = sqlx::query_as::<_, BookingSummary>(&format!(
            r#"{BOOKING_SUMMARY_SELECT}
            WHERE ($1::uuid IS NULL OR b.faculty_id = $1)
              AND ($2::booking_status IS NULL OR bk.status = $2)
              AND ($3::uuid IS NULL OR bk.room_id = $3)
              AND ($4::date IS NULL OR bk.booking_date = $4)
            ORDER BY bk.booking_date, bk.start_time
            "#
        ))
        .bind(faculty_id)
        .bind(filter.status)
        .bind(filter.room_id)
        .bind(filter.date)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    pub async fn documents_for_booking<'e, E>(&self, executor: E, booking_id: Uuid) -> Result<Vec<BookingDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let docs = sqlx::query_as::<_, BookingDocument>(
            "SELECT * FROM booking_documents WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(booking_id)
        .fetch_all(executor)
        .await?;
        Ok(docs)
    }

    pub async fn list_document_types(&self) -> Result<Vec<DocumentType>, AppError> {
        let types = sqlx::query_as::<_, DocumentType>(
            "SELECT id, slug, name, description FROM document_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }
}
