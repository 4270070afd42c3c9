// src/services/maintenance_service.rs

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::begin_scoped_tx,
        error::{field_error, AppError},
    },
    db::{MaintenanceRepository, RoomRepository},
    models::{
        auth::Principal,
        maintenance::{MaintenanceLog, MaintenanceStatus, NewMaintenance},
    },
    services::scope_service::ResolvedScope,
};

pub fn validate_maintenance(entry: &NewMaintenance) -> Result<(), AppError> {
    if entry.end_time <= entry.start_time {
        return Err(field_error("end_time", "time_window", "validation.time_window"));
    }
    if entry.maintenance_type.trim().is_empty() {
        return Err(field_error("maintenance_type", "required", "validation.required"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MaintenanceService {
    repo: MaintenanceRepository,
    room_repo: RoomRepository,
    pool: PgPool,
}

impl MaintenanceService {
    pub fn new(repo: MaintenanceRepository, room_repo: RoomRepository, pool: PgPool) -> Self {
        Self { repo, room_repo, pool }
    }

    /// Registra uma janela de manutenção. Não cancela nem bloqueia reservas.
    pub async fn create(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        entry: NewMaintenance,
    ) -> Result<MaintenanceLog, AppError> {
        validate_maintenance(&entry)?;

        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;
        let room = self
            .room_repo
            .lock(&mut *tx, entry.room_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Room {}", entry.room_id)))?;
        scope.ensure_covers(room.faculty_id)?;

        let log = self.repo.insert(&mut *tx, principal.id(), &entry).await?;
        tx.commit().await?;

        tracing::info!(maintenance_id = %log.id, room_id = %log.room_id, date = %log.maintenance_date, "Manutenção registrada");
        Ok(log)
    }

    pub async fn list(
        &self,
        scope: &ResolvedScope,
        room_id: Option<Uuid>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<MaintenanceLog>, AppError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(field_error("end", "date_range", "validation.date_range"));
            }
        }
        let faculty = scope.listing_filter()?;
        self.repo.list(faculty, room_id, start, end).await
    }

    pub async fn update_status(
        &self,
        principal: &Principal,
        scope: &ResolvedScope,
        id: Uuid,
        status: MaintenanceStatus,
    ) -> Result<MaintenanceLog, AppError> {
        let mut tx = begin_scoped_tx(&self.pool, principal.id(), &scope.scope).await?;

        let faculty = self
            .repo
            .faculty_of(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Maintenance {}", id)))?;
        scope.ensure_covers(faculty)?;

        let log = self
            .repo
            .update_status(&mut *tx, id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Maintenance {}", id)))?;
        tx.commit().await?;

        tracing::info!(maintenance_id = %id, status = ?status, "Status da manutenção atualizado");
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn entry(start: u32, end: u32, kind: &str) -> NewMaintenance {
        NewMaintenance {
            room_id: Uuid::new_v4(),
            maintenance_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            maintenance_type: kind.into(),
            notes: None,
        }
    }

    #[test]
    fn window_must_be_positive() {
        assert!(validate_maintenance(&entry(13, 15, "Servis AC")).is_ok());
        assert!(validate_maintenance(&entry(15, 13, "Servis AC")).is_err());
        assert!(validate_maintenance(&entry(13, 13, "Servis AC")).is_err());
    }

    #[test]
    fn type_is_required() {
        assert!(validate_maintenance(&entry(13, 15, "  ")).is_err());
    }
}
