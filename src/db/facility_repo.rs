// src/db/facility_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::facility::{Facility, FacilityUnit, RoomFacility, RoomFacilityEntry},
};

#[derive(Clone)]
pub struct FacilityRepository {
    pool: PgPool,
}

impl FacilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CATÁLOGO
    // =========================================================================

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Facility>, AppError> {
        let facilities = sqlx::query_as::<_, Facility>(
            "SELECT * FROM facilities WHERE ($1 OR is_active) ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(facilities)
    }

    /// Busca por nome exato.
    pub async fn find_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<Facility>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let facility = sqlx::query_as::<_, Facility>("SELECT * FROM facilities WHERE name = $1")
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(facility)
    }

    /// Lock de transação por código base: criações com a mesma base fazem fila.
    pub async fn lock_code_base<'e, E>(&self, executor: E, base: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('facility_code:' || $1))")
            .bind(base)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Códigos que começam com `prefix` (para resolver colisões).
    pub async fn codes_with_prefix<'e, E>(&self, executor: E, prefix: &str) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let codes = sqlx::query_scalar::<_, String>(
            "SELECT code FROM facilities WHERE starts_with(code, $1)",
        )
        .bind(prefix)
        .fetch_all(executor)
        .await?;
        Ok(codes)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        name: &str,
        code: &str,
        description: Option<&str>,
        unit: FacilityUnit,
    ) -> Result<Facility, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Facility>(
            r#"
            INSERT INTO facilities (name, code, description, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(code)
        .bind(description)
        .bind(unit)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        unit: FacilityUnit,
        is_active: bool,
    ) -> Result<Option<Facility>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Facility>(
            r#"
            UPDATE facilities
            SET name = $2, description = $3, unit = $4, is_active = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(unit)
        .bind(is_active)
        .fetch_optional(executor)
        .await
        .map_err(map_db_error)
    }

    /// Quais dos IDs existem (ativos ou não).
    pub async fn existing_ids<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let found = sqlx::query_scalar::<_, Uuid>("SELECT id FROM facilities WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(found)
    }

    // =========================================================================
    //  VÍNCULO SALA <-> FACILIDADE
    // =========================================================================

    pub async fn links_for_room<'e, E>(&self, executor: E, room_id: Uuid) -> Result<Vec<RoomFacility>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let links = sqlx::query_as::<_, RoomFacility>(
            "SELECT room_id, facility_id, quantity, notes FROM room_facilities WHERE room_id = $1",
        )
        .bind(room_id)
        .fetch_all(executor)
        .await?;
        Ok(links)
    }

    pub async fn entries_for_room<'e, E>(&self, executor: E, room_id: Uuid) -> Result<Vec<RoomFacilityEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entries = sqlx::query_as::<_, RoomFacilityEntry>(
            r#"
            SELECT rf.facility_id, f.name, f.code, f.unit, rf.quantity, rf.notes
            FROM room_facilities rf
            JOIN facilities f ON f.id = rf.facility_id
            WHERE rf.room_id = $1
            ORDER BY f.name
            "#,
        )
        .bind(room_id)
        .fetch_all(executor)
        .await?;
        Ok(entries)
    }

    pub async fn insert_link<'e, E>(
        &self,
        executor: E,
        room_id: Uuid,
        facility_id: Uuid,
        quantity: i32,
        notes: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO room_facilities (room_id, facility_id, quantity, notes)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (room_id, facility_id) DO NOTHING
            "#,
        )
        .bind(room_id)
        .bind(facility_id)
        .bind(quantity)
        .bind(notes)
        .execute(executor)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn update_link<'e, E>(
        &self,
        executor: E,
        room_id: Uuid,
        facility_id: Uuid,
        quantity: i32,
        notes: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE room_facilities
            SET quantity = $3, notes = $4, updated_at = NOW()
            WHERE room_id = $1 AND facility_id = $2
            "#,
        )
        .bind(room_id)
        .bind(facility_id)
        .bind(quantity)
        .bind(notes)
        .execute(executor)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn delete_links<'e, E>(&self, executor: E, room_id: Uuid, facility_ids: &[Uuid]) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM room_facilities WHERE room_id = $1 AND facility_id = ANY($2)")
            .bind(room_id)
            .bind(facility_ids)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
