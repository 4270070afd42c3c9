// src/db/maintenance_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::maintenance::{MaintenanceLog, MaintenanceStatus, NewMaintenance},
};

#[derive(Clone)]
pub struct MaintenanceRepository {
    pool: PgPool,
}

impl MaintenanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        created_by: Uuid,
        entry: &NewMaintenance,
    ) -> Result<MaintenanceLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MaintenanceLog>(
            r#"
            INSERT INTO maintenance_logs (
                room_id, maintenance_date, start_time, end_time,
                maintenance_type, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(entry.room_id)
        .bind(entry.maintenance_date)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .bind(&entry.maintenance_type)
        .bind(&entry.notes)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }

    /// Lista com filtros opcionais; `faculty_id = None` não restringe.
    pub async fn list(
        &self,
        faculty_id: Option<Uuid>,
        room_id: Option<Uuid>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<MaintenanceLog>, AppError> {
        let logs = sqlx::query_as::<_, MaintenanceLog>(
            r#"
            SELECT m.*
            FROM maintenance_logs m
            JOIN rooms r ON r.id = m.room_id
            JOIN buildings b ON b.id = r.building_id
            WHERE ($1::uuid IS NULL OR b.faculty_id = $1)
              AND ($2::uuid IS NULL OR m.room_id = $2)
              AND ($3::date IS NULL OR m.maintenance_date >= $3)
              AND ($4::date IS NULL OR m.maintenance_date <= $4)
            ORDER BY m.maintenance_date, m.start_time
            "#,
        )
        .bind(faculty_id)
        .bind(room_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    /// Faculdade dona da sala do registro (para checagem de escopo).
    pub async fn faculty_of<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let faculty = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT b.faculty_id
            FROM maintenance_logs m
            JOIN rooms r ON r.id = m.room_id
            JOIN buildings b ON b.id = r.building_id
            WHERE m.id = $1
            FOR UPDATE OF m
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(faculty)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: MaintenanceStatus,
    ) -> Result<Option<MaintenanceLog>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let log = sqlx::query_as::<_, MaintenanceLog>(
            "UPDATE maintenance_logs SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?;
        Ok(log)
    }
}
