// src/db/room_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::room::{Room, RoomFilter, RoomInput, RoomLock, RoomSummary},
};

// Sala + prédio + categoria + faculdade (cadeia Room -> Building -> Faculty)
const ROOM_SUMMARY_SELECT: &str = r#"
    SELECT r.id, r.building_id, r.category_id, r.code, r.name, r.location_detail,
           r.capacity, r.description, r.status, r.image_path, r.created_at, r.updated_at,
           b.name AS building_name, c.name AS category_name,
           f.id AS faculty_id, f.name AS faculty_name
    FROM rooms r
    JOIN buildings b ON b.id = r.building_id
    JOIN faculties f ON f.id = b.faculty_id
    JOIN room_categories c ON c.id = r.category_id
"#;

#[derive(Clone)]
pub struct RoomRepository {
    pool: PgPool,
}

impl RoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `faculty_id = None` não filtra por faculdade.
    pub async fn list(&self, faculty_id: Option<Uuid>, filter: &RoomFilter) -> Result<Vec<RoomSummary>, AppError> {
        let rooms = sqlx::query_as::<_, RoomSummary>(&format!(
            r#"{ROOM_SUMMARY_SELECT}
            WHERE ($1::uuid IS NULL OR f.id = $1)
              AND ($2::uuid IS NULL OR r.building_id = $2)
              AND ($3::uuid IS NULL OR r.category_id = $3)
              AND ($4::room_status IS NULL OR r.status = $4)
            ORDER BY r.code
            "#
        ))
        .bind(faculty_id)
        .bind(filter.building_id)
        .bind(filter.category_id)
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rooms)
    }

    pub async fn find_summary<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<RoomSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let room = sqlx::query_as::<_, RoomSummary>(&format!("{ROOM_SUMMARY_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(room)
    }

    /// Trava a linha da sala até o fim da transação. Serializa reservas por sala.
    pub async fn lock<'e, E>(&self, executor: E, room_id: Uuid) -> Result<Option<RoomLock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lock = sqlx::query_as::<_, RoomLock>(
            r#"
            SELECT r.id, r.name, r.capacity, b.faculty_id
            FROM rooms r
            JOIN buildings b ON b.id = r.building_id
            WHERE r.id = $1
            FOR UPDATE OF r
            "#,
        )
        .bind(room_id)
        .fetch_optional(executor)
        .await?;
        Ok(lock)
    }

    /// Mesma trava, a partir do ID da reserva.
    pub async fn lock_for_booking<'e, E>(&self, executor: E, booking_id: Uuid) -> Result<Option<RoomLock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lock = sqlx::query_as::<_, RoomLock>(
            r#"
            SELECT r.id, r.name, r.capacity, b.faculty_id
            FROM bookings bk
            JOIN rooms r ON r.id = bk.room_id
            JOIN buildings b ON b.id = r.building_id
            WHERE bk.id = $1
            FOR UPDATE OF r
            "#,
        )
        .bind(booking_id)
        .fetch_optional(executor)
        .await?;
        Ok(lock)
    }

    pub async fn insert<'e, E>(&self, executor: E, input: &RoomInput) -> Result<Room, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (
                building_id, category_id, code, name, location_detail,
                capacity, description, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.building_id)
        .bind(input.category_id)
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.location_detail)
        .bind(input.capacity)
        .bind(&input.description)
        .bind(input.status)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, input: &RoomInput) -> Result<Option<Room>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Room>(
            r#"
            UPDATE rooms
            SET building_id = $2, category_id = $3, code = $4, name = $5,
                location_detail = $6, capacity = $7, description = $8, status = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.building_id)
        .bind(input.category_id)
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.location_detail)
        .bind(input.capacity)
        .bind(&input.description)
        .bind(input.status)
        .fetch_optional(executor)
        .await
        .map_err(map_db_error)
    }

    /// Devolve o caminho da imagem anterior.
    pub async fn set_image<'e, E>(&self, executor: E, id: Uuid, image_path: &str) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE rooms r
            SET image_path = $2, updated_at = NOW()
            FROM rooms old
            WHERE r.id = $1 AND old.id = r.id
            RETURNING old.image_path
            "#,
        )
        .bind(id)
        .bind(image_path)
        .fetch_optional(executor)
        .await?;
        Ok(previous.flatten())
    }

    pub async fn has_bookings<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM bookings WHERE room_id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let image = sqlx::query_scalar::<_, Option<String>>("DELETE FROM rooms WHERE id = $1 RETURNING image_path")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(map_db_error)?;
        Ok(image.flatten())
    }
}
