// src/db/faculty_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_db_error, error::AppError},
    models::faculty::{Building, Faculty, RoomCategory},
};

#[derive(Clone)]
pub struct FacultyRepository {
    pool: PgPool,
}

impl FacultyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  GRANTS & SELEÇÃO
    // =========================================================================

    /// Faculdades liberadas para o usuário (tabela user_faculties).
    pub async fn granted_faculty_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT faculty_id FROM user_faculties WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn grant<'e, E>(&self, executor: E, user_id: Uuid, faculty_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO user_faculties (user_id, faculty_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(faculty_id)
        .execute(executor)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn revoke<'e, E>(&self, executor: E, user_id: Uuid, faculty_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM user_faculties WHERE user_id = $1 AND faculty_id = $2")
            .bind(user_id)
            .bind(faculty_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_selection(&self, user_id: Uuid) -> Result<Option<Uuid>, AppError> {
        let selected = sqlx::query_scalar::<_, Uuid>(
            "SELECT faculty_id FROM faculty_selections WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(selected)
    }

    pub async fn save_selection<'e, E>(&self, executor: E, user_id: Uuid, faculty_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO faculty_selections (user_id, faculty_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET faculty_id = EXCLUDED.faculty_id, selected_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(faculty_id)
        .execute(executor)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn clear_selection<'e, E>(&self, executor: E, user_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM faculty_selections WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // =========================================================================
    //  FACULDADES
    // =========================================================================

    /// `only = None` lista todas (Super Admin).
    pub async fn list_faculties(&self, only: Option<&[Uuid]>) -> Result<Vec<Faculty>, AppError> {
        let faculties = match only {
            None => {
                sqlx::query_as::<_, Faculty>("SELECT * FROM faculties ORDER BY name")
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(ids) => {
                sqlx::query_as::<_, Faculty>("SELECT * FROM faculties WHERE id = ANY($1) ORDER BY name")
                    .bind(ids)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(faculties)
    }

    pub async fn find_faculty(&self, id: Uuid) -> Result<Option<Faculty>, AppError> {
        let faculty = sqlx::query_as::<_, Faculty>("SELECT * FROM faculties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(faculty)
    }

    pub async fn create_faculty<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Faculty, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Faculty>(
            "INSERT INTO faculties (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }

    // =========================================================================
    //  PRÉDIOS
    // =========================================================================

    pub async fn list_buildings(&self, faculty_id: Option<Uuid>) -> Result<Vec<Building>, AppError> {
        let buildings = sqlx::query_as::<_, Building>(
            r#"
            SELECT * FROM buildings
            WHERE ($1::uuid IS NULL OR faculty_id = $1)
            ORDER BY name
            "#,
        )
        .bind(faculty_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(buildings)
    }

    pub async fn find_building<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Building>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let building = sqlx::query_as::<_, Building>("SELECT * FROM buildings WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(building)
    }

    pub async fn create_building<'e, E>(
        &self,
        executor: E,
        faculty_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Building, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Building>(
            r#"
            INSERT INTO buildings (faculty_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(faculty_id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }

    // =========================================================================
    //  CATEGORIAS DE SALA
    // =========================================================================

    pub async fn list_room_categories(&self) -> Result<Vec<RoomCategory>, AppError> {
        let categories = sqlx::query_as::<_, RoomCategory>("SELECT * FROM room_categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn create_room_category<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<RoomCategory, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, RoomCategory>(
            "INSERT INTO room_categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(map_db_error)
    }
}
