// src/services/facility_service.rs

use std::{collections::HashSet, sync::Arc};

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::{field_error, AppError},
    db::FacilityRepository,
    models::facility::{AttachMode, Facility, FacilityAssignment, FacilityUnit, RoomFacility},
    services::facility_naming::{next_available_code, FacilityNaming},
};

/// Alterações a aplicar no vínculo sala <-> facilidade.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FacilityChangePlan {
    pub inserts: Vec<FacilityAssignment>,
    pub updates: Vec<FacilityAssignment>,
    pub removals: Vec<Uuid>,
}

impl FacilityChangePlan {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.removals.is_empty()
    }
}

/// IDs repetidos: vale a última ocorrência, na ordem da primeira.
fn dedupe(desired: &[FacilityAssignment]) -> Vec<FacilityAssignment> {
    let mut result: Vec<FacilityAssignment> = Vec::with_capacity(desired.len());
    for item in desired {
        match result.iter_mut().find(|a| a.facility_id == item.facility_id) {
            Some(existing) => *existing = item.clone(),
            None => result.push(item.clone()),
        }
    }
    result
}

pub fn plan_facility_changes(
    current: &[RoomFacility],
    desired: &[FacilityAssignment],
    mode: AttachMode,
) -> FacilityChangePlan {
    let desired = dedupe(desired);
    let mut plan = FacilityChangePlan::default();

    for item in &desired {
        match current.iter().find(|c| c.facility_id == item.facility_id) {
            None => plan.inserts.push(item.clone()),
            Some(link) if mode == AttachMode::Sync => {
                if link.quantity != item.quantity || link.notes != item.notes {
                    plan.updates.push(item.clone());
                }
            }
            // Attach: já vinculado, ignora.
            Some(_) => {}
        }
    }

    if mode == AttachMode::Sync {
        plan.removals = current
            .iter()
            .filter(|c| !desired.iter().any(|d| d.facility_id == c.facility_id))
            .map(|c| c.facility_id)
            .collect();
    }

    plan
}

const FACILITY_NAME_KEY: &str = "facilities_name_key";
const FACILITY_CODE_KEY: &str = "facilities_code_key";
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Qual chave única de `facilities` foi violada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FacilityKey {
    Name,
    Code,
    Other,
}

fn violated_key(constraint: &str) -> FacilityKey {
    match constraint {
        FACILITY_NAME_KEY => FacilityKey::Name,
        FACILITY_CODE_KEY => FacilityKey::Code,
        _ => FacilityKey::Other,
    }
}

pub fn validate_assignments(desired: &[FacilityAssignment]) -> Result<(), AppError> {
    if desired.iter().any(|a| a.quantity < 1) {
        return Err(field_error("facilities", "quantity_positive", "validation.quantity_positive"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct FacilityService {
    repo: FacilityRepository,
    naming: Arc<dyn FacilityNaming>,
    pool: PgPool,
}

impl FacilityService {
    pub fn new(repo: FacilityRepository, naming: Arc<dyn FacilityNaming>, pool: PgPool) -> Self {
        Self { repo, naming, pool }
    }

    pub async fn list_facilities(&self, include_inactive: bool) -> Result<Vec<Facility>, AppError> {
        self.repo.list(include_inactive).await
    }

    /// Busca pelo nome exato; se não existir, cria com código gerado.
    pub async fn ensure_facility(&self, name: &str) -> Result<Facility, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(field_error("name", "required", "validation.name_required"));
        }

        if let Some(existing) = self.repo.find_by_name(&self.pool, name).await? {
            return Ok(existing);
        }

        match self.create_facility(name, None, None).await {
            // Outra requisição criou o mesmo nome no meio do caminho.
            Err(AppError::UniqueConstraintViolation(constraint))
                if violated_key(&constraint) == FacilityKey::Name =>
            {
                self.repo
                    .find_by_name(&self.pool, name)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound(format!("Facility {}", name)))
            }
            other => other,
        }
    }

    pub async fn create_facility(
        &self,
        name: &str,
        description: Option<&str>,
        unit: Option<FacilityUnit>,
    ) -> Result<Facility, AppError> {
        let name = name.trim();
        let mut attempt = 1;
        loop {
            match self.insert_with_free_code(name, description, unit).await {
                Err(AppError::UniqueConstraintViolation(constraint))
                    if violated_key(&constraint) == FacilityKey::Code && attempt < MAX_CODE_ATTEMPTS =>
                {
                    tracing::warn!(%name, attempt, "Código de facilidade tomado por criação concorrente, tentando de novo");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn insert_with_free_code(
        &self,
        name: &str,
        description: Option<&str>,
        unit: Option<FacilityUnit>,
    ) -> Result<Facility, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Código base + resolução de colisão (serializado por base)
        let base = self.naming.base_code(name);
        self.repo.lock_code_base(&mut *tx, &base).await?;
        let taken: HashSet<String> = self
            .repo
            .codes_with_prefix(&mut *tx, &base)
            .await?
            .into_iter()
            .collect();
        let code = next_available_code(&base, &taken);

        // 2. Unidade inferida só aqui, na criação
        let unit = unit.unwrap_or_else(|| self.naming.infer_unit(name));

        let facility = self.repo.insert(&mut *tx, name, &code, description, unit).await?;
        tx.commit().await?;

        tracing::info!(facility_id = %facility.id, code = %facility.code, "Facilidade criada");
        Ok(facility)
    }

    pub async fn update_facility(
        &self,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        unit: FacilityUnit,
        is_active: bool,
    ) -> Result<Facility, AppError> {
        self.repo
            .update(&self.pool, id, name.trim(), description, unit, is_active)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Facility {}", id)))
    }

    /// Aplica as facilidades de uma sala dentro da transação do chamador.
    pub async fn apply_assignments(
        &self,
        conn: &mut PgConnection,
        room_id: Uuid,
        desired: &[FacilityAssignment],
        mode: AttachMode,
    ) -> Result<FacilityChangePlan, AppError> {
        validate_assignments(desired)?;

        // 1. Toda facilidade referenciada precisa existir
        let requested: Vec<Uuid> = desired.iter().map(|a| a.facility_id).collect();
        if !requested.is_empty() {
            let found = self.repo.existing_ids(&mut *conn, &requested).await?;
            if let Some(missing) = requested.iter().find(|id| !found.contains(id)) {
                tracing::error!(%room_id, facility_id = %missing, "Facilidade inexistente no vínculo");
                return Err(AppError::DanglingReference(format!("Facility {}", missing)));
            }
        }

        // 2. Calcula o diff contra o estado atual
        let current = self.repo.links_for_room(&mut *conn, room_id).await?;
        let plan = plan_facility_changes(&current, desired, mode);

        // 3. Executa
        if !plan.removals.is_empty() {
            self.repo.delete_links(&mut *conn, room_id, &plan.removals).await?;
        }
        for item in &plan.updates {
            self.repo
                .update_link(&mut *conn, room_id, item.facility_id, item.quantity, item.notes.as_deref())
                .await?;
        }
        for item in &plan.inserts {
            self.repo
                .insert_link(&mut *conn, room_id, item.facility_id, item.quantity, item.notes.as_deref())
                .await?;
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(room: Uuid, facility: Uuid, quantity: i32, notes: Option<&str>) -> RoomFacility {
        RoomFacility { room_id: room, facility_id: facility, quantity, notes: notes.map(String::from) }
    }

    fn assign(facility: Uuid, quantity: i32, notes: Option<&str>) -> FacilityAssignment {
        FacilityAssignment { facility_id: facility, quantity, notes: notes.map(String::from) }
    }

    #[test]
    fn attach_skips_already_linked_facilities() {
        let room = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let current = vec![link(room, a, 1, None)];

        let plan = plan_facility_changes(&current, &[assign(a, 5, None), assign(b, 2, None)], AttachMode::Attach);

        assert_eq!(plan.inserts, vec![assign(b, 2, None)]);
        assert!(plan.updates.is_empty());
        assert!(plan.removals.is_empty());
    }

    #[test]
    fn sync_adds_updates_and_removes_in_one_pass() {
        let room = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let current = vec![link(room, a, 1, None), link(room, b, 3, Some("rusak 1"))];

        let plan = plan_facility_changes(&current, &[assign(b, 4, Some("rusak 1")), assign(c, 1, None)], AttachMode::Sync);

        assert_eq!(plan.inserts, vec![assign(c, 1, None)]);
        assert_eq!(plan.updates, vec![assign(b, 4, Some("rusak 1"))]);
        assert_eq!(plan.removals, vec![a]);
    }

    #[test]
    fn sync_with_identical_set_is_a_no_op() {
        let room = Uuid::new_v4();
        let a = Uuid::new_v4();
        let current = vec![link(room, a, 2, Some("baru"))];

        let plan = plan_facility_changes(&current, &[assign(a, 2, Some("baru"))], AttachMode::Sync);
        assert!(plan.is_empty());
    }

    #[test]
    fn sync_with_empty_set_removes_everything() {
        let room = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let current = vec![link(room, a, 1, None), link(room, b, 1, None)];

        let plan = plan_facility_changes(&current, &[], AttachMode::Sync);
        assert_eq!(plan.removals, vec![a, b]);
    }

    #[test]
    fn duplicate_ids_keep_the_last_value() {
        let a = Uuid::new_v4();
        let plan = plan_facility_changes(&[], &[assign(a, 1, None), assign(a, 7, Some("x"))], AttachMode::Attach);
        assert_eq!(plan.inserts, vec![assign(a, 7, Some("x"))]);
    }

    #[test]
    fn only_name_collisions_fall_back_to_lookup() {
        assert_eq!(violated_key("facilities_name_key"), FacilityKey::Name);
        assert_eq!(violated_key("facilities_code_key"), FacilityKey::Code);
        assert_eq!(violated_key("rooms_code_key"), FacilityKey::Other);
    }

    // ---
    // Com banco (pulados sem DATABASE_URL)
    // ---
    use crate::common::test_support;
    use crate::services::facility_naming::KeywordNaming;

    fn service(pool: &sqlx::PgPool) -> FacilityService {
        FacilityService::new(FacilityRepository::new(pool.clone()), Arc::new(KeywordNaming), pool.clone())
    }

    /// Nomes distintos cujas iniciais formam o mesmo código base.
    fn names_sharing_base(count: usize) -> (String, Vec<String>) {
        let tag: Vec<char> = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        let base: String = tag.iter().flat_map(|c| c.to_uppercase()).collect();
        let tail: Vec<String> = tag[1..].iter().map(|c| format!("{c}x")).collect();
        let names = (0..count)
            .map(|i| format!("{}nama{} {}", tag[0], i, tail.join(" ")))
            .collect();
        (base, names)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creations_with_same_base_code_all_succeed() {
        let Some(pool) = test_support::pool().await else { return };
        let facilities = service(&pool);
        let (base, names) = names_sharing_base(8);

        let handles: Vec<_> = names
            .into_iter()
            .map(|name| {
                let facilities = facilities.clone();
                tokio::spawn(async move { facilities.ensure_facility(&name).await })
            })
            .collect();

        let mut codes = Vec::new();
        let mut ids = HashSet::new();
        for handle in handles {
            let facility = handle.await.unwrap().unwrap();
            ids.insert(facility.id);
            codes.push(facility.code);
        }
        codes.sort();

        let mut expected: Vec<String> = std::iter::once(base.clone()).chain((1..8).map(|n| format!("{base}{n}"))).collect();
        expected.sort();
        assert_eq!(ids.len(), 8);
        assert_eq!(codes, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ensure_of_same_name_returns_one_facility() {
        let Some(pool) = test_support::pool().await else { return };
        let facilities = service(&pool);
        let name = test_support::unique("Meja Rapat");

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let facilities = facilities.clone();
                let name = name.clone();
                tokio::spawn(async move { facilities.ensure_facility(&name).await })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().id);
        }
        assert_eq!(ids.len(), 1);

        let again = facilities.ensure_facility(&name).await.unwrap();
        assert!(ids.contains(&again.id));
        assert_eq!(again.unit, FacilityUnit::Piece);
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let a = Uuid::new_v4();
        assert!(validate_assignments(&[assign(a, 1, None)]).is_ok());
        assert!(matches!(validate_assignments(&[assign(a, 0, None)]), Err(AppError::ValidationError(_))));
        assert!(matches!(validate_assignments(&[assign(a, -3, None)]), Err(AppError::ValidationError(_))));
    }
}
