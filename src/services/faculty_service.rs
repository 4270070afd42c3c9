// src/services/faculty_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped_tx, error::AppError},
    db::FacultyRepository,
    models::{
        auth::Principal,
        faculty::{Building, Faculty, RoomCategory},
    },
    services::scope_service::ResolvedScope,
};

// Cadastros de apoio: faculdades, prédios e categorias de sala
#[derive(Clone)]
pub struct FacultyService {
    repo: FacultyRepository,
    pool: PgPool,
}

impl FacultyService {
    pub fn new(repo: FacultyRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list_faculties(&self) -> Result<Vec<Faculty>, AppError> {
        self.repo.list_faculties(None).await
    }

    pub async fn create_faculty(&self, name: &str, description: Option<&str>) -> Result<Faculty, AppError> {
        let faculty = self.repo.create_faculty(&self.pool, name.trim(), description).await?;
        tracing::info!(faculty_id = %faculty.id, name = %faculty.name, "Faculdade criada");
        Ok(faculty)
    }

    pub async fn list_buildings(&self, scope: &ResolvedScope) -> Result<Vec<Building>, AppError> {
        let faculty = scope.listing_filter()?;
        self.repo.list_buildings(faculty).await
    }

    /// O prédio nasce dentro de uma faculdade coberta pelo escopo.
    pub async fn create_building(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        faculty_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Building, AppError> {
        scope.ensure_covers(faculty_id)?;

        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;
        let building = self.repo.create_building(&mut *tx, faculty_id, name.trim(), description).await?;
        tx.commit().await?;

        tracing::info!(building_id = %building.id, %faculty_id, "Prédio criado");
        Ok(building)
    }

    pub async fn list_room_categories(&self) -> Result<Vec<RoomCategory>, AppError> {
        self.repo.list_room_categories().await
    }

    pub async fn create_room_category(&self, name: &str, description: Option<&str>) -> Result<RoomCategory, AppError> {
        let category = self.repo.create_room_category(&self.pool, name.trim(), description).await?;
        tracing::info!(category_id = %category.id, "Categoria de sala criada");
        Ok(category)
    }
}
