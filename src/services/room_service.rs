// src/services/room_service.rs

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_scoped_tx, error::AppError},
    db::{FacilityRepository, FacultyRepository, RoomRepository},
    models::{
        auth::Principal,
        facility::{AttachMode, FacilityAssignment},
        room::{RoomDetail, RoomFilter, RoomInput, RoomSummary},
    },
    services::{
        facility_service::FacilityService,
        scope_service::ResolvedScope,
        storage::{discard_all, validate_upload, DocumentStorage, IMAGE_EXTENSIONS},
    },
};

const ROOM_IMAGE_FOLDER: &str = "rooms";

#[derive(Clone)]
pub struct RoomService {
    repo: RoomRepository,
    faculty_repo: FacultyRepository,
    facility_repo: FacilityRepository,
    facility_service: FacilityService,
    storage: Arc<dyn DocumentStorage>,
    max_upload_bytes: usize,
    pool: PgPool,
}

impl RoomService {
    pub fn new(
        repo: RoomRepository,
        faculty_repo: FacultyRepository,
        facility_repo: FacilityRepository,
        facility_service: FacilityService,
        storage: Arc<dyn DocumentStorage>,
        max_upload_bytes: usize,
        pool: PgPool,
    ) -> Self {
        Self { repo, faculty_repo, facility_repo, facility_service, storage, max_upload_bytes, pool }
    }

    pub async fn list_rooms(&self, scope: &ResolvedScope, filter: &RoomFilter) -> Result<Vec<RoomSummary>, AppError> {
        let faculty = scope.listing_filter()?;
        self.repo.list(faculty, filter).await
    }

    pub async fn get_room(&self, scope: &ResolvedScope, id: Uuid) -> Result<RoomDetail, AppError> {
        let summary = self
            .repo
            .find_summary(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Room {}", id)))?;

        if let Some(faculty) = scope.listing_filter()? {
            if faculty != summary.faculty_id {
                return Err(AppError::ForbiddenScope);
            }
        }

        let facilities = self.facility_repo.entries_for_room(&self.pool, id).await?;
        Ok(RoomDetail { summary, facilities })
    }

    /// Cria a sala e vincula as facilidades (attach) na mesma transação.
    pub async fn create_room(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        input: RoomInput,
        facilities: &[FacilityAssignment],
    ) -> Result<RoomDetail, AppError> {
        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;

        // 1. O prédio define a faculdade dona da sala
        let building = self
            .faculty_repo
            .find_building(&mut *tx, input.building_id)
            .await?
            .ok_or_else(|| AppError::DanglingReference(format!("Building {}", input.building_id)))?;
        scope.ensure_covers(building.faculty_id)?;

        // 2. Sala + facilidades
        let room = self.repo.insert(&mut *tx, &input).await?;
        self.facility_service
            .apply_assignments(&mut *tx, room.id, facilities, AttachMode::Attach)
            .await?;

        tx.commit().await?;
        tracing::info!(room_id = %room.id, code = %room.code, "Sala criada");

        self.get_room(scope, room.id).await
    }

    /// Atualiza a sala; `facilities = Some(..)` sincroniza o conjunto inteiro.
    pub async fn update_room(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        id: Uuid,
        input: RoomInput,
        facilities: Option<&[FacilityAssignment]>,
    ) -> Result<RoomDetail, AppError> {
        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;

        let current = self
            .repo
            .lock(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Room {}", id)))?;
        scope.ensure_covers(current.faculty_id)?;

        // Mudar de prédio não pode tirar a sala do escopo
        let building = self
            .faculty_repo
            .find_building(&mut *tx, input.building_id)
            .await?
            .ok_or_else(|| AppError::DanglingReference(format!("Building {}", input.building_id)))?;
        scope.ensure_covers(building.faculty_id)?;

        self.repo
            .update(&mut *tx, id, &input)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Room {}", id)))?;

        if let Some(facilities) = facilities {
            self.facility_service
                .apply_assignments(&mut *tx, id, facilities, AttachMode::Sync)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(room_id = %id, "Sala atualizada");

        self.get_room(scope, id).await
    }

    pub async fn sync_facilities(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        id: Uuid,
        facilities: &[FacilityAssignment],
    ) -> Result<RoomDetail, AppError> {
        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;

        let room = self
            .repo
            .lock(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Room {}", id)))?;
        scope.ensure_covers(room.faculty_id)?;

        let plan = self
            .facility_service
            .apply_assignments(&mut *tx, id, facilities, AttachMode::Sync)
            .await?;

        tx.commit().await?;
        tracing::info!(
            room_id = %id,
            inserted = plan.inserts.len(),
            updated = plan.updates.len(),
            removed = plan.removals.len(),
            "Facilidades da sala sincronizadas"
        );

        self.get_room(scope, id).await
    }

    pub async fn delete_room(&self, principal: &Principal, scope: &ResolvedScope, id: Uuid) -> Result<(), AppError> {
        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;

        let room = self
            .repo
            .lock(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Room {}", id)))?;
        scope.ensure_covers(room.faculty_id)?;

        if self.repo.has_bookings(&mut *tx, id).await? {
            return Err(AppError::ResourceInUse(format!("Room {}", id)));
        }

        let image = self.repo.delete(&mut *tx, id).await?;
        tx.commit().await?;
        tracing::info!(room_id = %id, "Sala removida");

        if let Some(path) = image {
            if let Err(e) = self.storage.remove(&path).await {
                tracing::warn!(%path, "Falha ao remover imagem da sala: {}", e);
            }
        }
        Ok(())
    }

    /// Grava a nova imagem; a anterior só é apagada depois do commit.
    pub async fn set_room_image(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        id: Uuid,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<RoomDetail, AppError> {
        validate_upload("image", original_filename, bytes.len(), IMAGE_EXTENSIONS, self.max_upload_bytes)?;

        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;
        let room = self
            .repo
            .lock(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Room {}", id)))?;
        scope.ensure_covers(room.faculty_id)?;

        let stored = self.storage.store(ROOM_IMAGE_FOLDER, original_filename, bytes).await?;

        let previous = match self.repo.set_image(&mut *tx, id, &stored.path).await {
            Ok(previous) => previous,
            Err(e) => {
                discard_all(self.storage.as_ref(), std::slice::from_ref(&stored)).await;
                return Err(e);
            }
        };
        if let Err(e) = tx.commit().await {
            discard_all(self.storage.as_ref(), std::slice::from_ref(&stored)).await;
            return Err(e.into());
        }

        if let Some(old) = previous.filter(|old| *old != stored.path) {
            if let Err(e) = self.storage.remove(&old).await {
                tracing::warn!(path = %old, "Falha ao remover imagem antiga: {}", e);
            }
        }

        self.get_room(scope, id).await
    }
}
