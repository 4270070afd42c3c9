// src/db/calendar_repo.rs

use chrono::NaiveDate;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::calendar::{BookingEventRow, MaintenanceEventRow},
};

/// Filtros já resolvidos (escopo + query string).
#[derive(Debug, Clone, Copy)]
pub struct EventWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub faculty_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
}

#[derive(Clone, Default)]
pub struct CalendarRepository;

impl CalendarRepository {
    pub fn new() -> Self {
        Self
    }

    /// Lê reservas e manutenções no mesmo snapshot.
    pub async fn fetch_events<'e, E>(
        &self,
        executor: E,
        window: EventWindow,
    ) -> Result<(Vec<BookingEventRow>, Vec<MaintenanceEventRow>), AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // A. Reservas (todos os status; o calendário mostra pendentes também)
        let bookings = sqlx::query_as::<_, BookingEventRow>(
            r#"
            SELECT bk.id, bk.purpose, bk.booking_date, bk.start_time, bk.end_time,
                   r.id AS room_id, r.name AS room_name, bk.status,
                   u.name AS requester_name
            FROM bookings bk
            JOIN rooms r ON r.id = bk.room_id
            JOIN buildings b ON b.id = r.building_id
            JOIN users u ON u.id = bk.user_id
            WHERE bk.booking_date BETWEEN $1 AND $2
              AND ($3::uuid IS NULL OR b.faculty_id = $3)
              AND ($4::uuid IS NULL OR bk.room_id = $4)
            ORDER BY bk.booking_date, bk.start_time
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .bind(window.faculty_id)
        .bind(window.room_id)
        .fetch_all(&mut *tx)
        .await?;

        // B. Manutenções
        let maintenance = sqlx::query_as::<_, MaintenanceEventRow>(
            r#"
            SELECT m.id, m.maintenance_type, m.maintenance_date, m.start_time, m.end_time,
                   r.id AS room_id, r.name AS room_name, m.status, m.notes
            FROM maintenance_logs m
            JOIN rooms r ON r.id = m.room_id
            JOIN buildings b ON b.id = r.building_id
            WHERE m.maintenance_date BETWEEN $1 AND $2
              AND ($3::uuid IS NULL OR b.faculty_id = $3)
              AND ($4::uuid IS NULL OR m.room_id = $4)
            ORDER BY m.maintenance_date, m.start_time
            "#,
        )
        .bind(window.start)
        .bind(window.end)
        .bind(window.faculty_id)
        .bind(window.room_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((bookings, maintenance))
    }
}
