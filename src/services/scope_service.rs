// src/services/scope_service.rs

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FacultyRepository, UserRepository},
    models::{
        auth::Principal,
        faculty::FacultySelectionView,
        rbac::{Capability, Role},
    },
};

// ---
// Escopo de faculdade
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "facultyId", rename_all = "snake_case")]
pub enum FacultyScope {
    None,
    All,
    Specific(Uuid),
}

impl FacultyScope {
    pub fn faculty_id(&self) -> Option<Uuid> {
        match self {
            FacultyScope::Specific(id) => Some(*id),
            _ => None,
        }
    }

    pub fn covers(&self, faculty_id: Uuid) -> bool {
        match self {
            FacultyScope::All => true,
            FacultyScope::Specific(id) => *id == faculty_id,
            FacultyScope::None => false,
        }
    }

    /// Mutações fora do escopo (ou sem escopo) falham com ForbiddenScope.
    pub fn ensure_covers(&self, faculty_id: Uuid) -> Result<(), AppError> {
        if self.covers(faculty_id) {
            Ok(())
        } else {
            Err(AppError::ForbiddenScope)
        }
    }
}

/// Resultado puro da resolução.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeResolution {
    pub scope: FacultyScope,
    pub reselect_required: bool,
    /// A seleção salva não é mais permitida e deve ser apagada.
    pub invalidate_selection: bool,
}

pub fn resolve_scope(role: Role, selected: Option<Uuid>, granted: &[Uuid]) -> ScopeResolution {
    if role.can(Capability::BypassScope) {
        return ScopeResolution {
            scope: FacultyScope::All,
            reselect_required: false,
            invalidate_selection: false,
        };
    }

    // Mahasiswa nunca seleciona faculdade: navega globalmente.
    if !role.can(Capability::SelectFaculty) {
        return ScopeResolution {
            scope: FacultyScope::None,
            reselect_required: false,
            invalidate_selection: false,
        };
    }

    match selected {
        Some(id) if granted.contains(&id) => ScopeResolution {
            scope: FacultyScope::Specific(id),
            reselect_required: false,
            invalidate_selection: false,
        },
        Some(_) => ScopeResolution {
            scope: FacultyScope::None,
            reselect_required: true,
            invalidate_selection: true,
        },
        None => ScopeResolution {
            scope: FacultyScope::None,
            reselect_required: true,
            invalidate_selection: false,
        },
    }
}

/// Escopo da requisição, resolvido uma vez e passado explicitamente.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedScope {
    pub role: Role,
    pub scope: FacultyScope,
    pub reselect_required: bool,
}

impl ResolvedScope {
    /// Filtro de leitura por faculdade (`None` = sem filtro).
    pub fn listing_filter(&self) -> Result<Option<Uuid>, AppError> {
        match self.scope {
            FacultyScope::All => Ok(None),
            FacultyScope::Specific(id) => Ok(Some(id)),
            FacultyScope::None if !self.role.is_admin_tier() => Ok(None),
            FacultyScope::None => Err(AppError::FacultySelectionRequired),
        }
    }

    pub fn ensure_covers(&self, faculty_id: Uuid) -> Result<(), AppError> {
        if self.reselect_required {
            return Err(AppError::FacultySelectionRequired);
        }
        self.scope.ensure_covers(faculty_id)
    }
}

#[derive(Clone)]
pub struct ScopeService {
    faculty_repo: FacultyRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl ScopeService {
    pub fn new(faculty_repo: FacultyRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { faculty_repo, user_repo, pool }
    }

    /// Resolve o escopo do principal; apaga seleções que perderam o acesso.
    pub async fn resolve(&self, principal: &Principal) -> Result<ResolvedScope, AppError> {
        let selected = self.faculty_repo.find_selection(principal.id()).await?;
        let resolution = resolve_scope(principal.role(), selected, &principal.faculty_ids);

        if resolution.invalidate_selection {
            tracing::warn!(
                user_id = %principal.id(),
                faculty_id = ?selected,
                "Seleção de faculdade sem acesso; limpando"
            );
            self.faculty_repo.clear_selection(&self.pool, principal.id()).await?;
        }

        Ok(ResolvedScope {
            role: principal.role(),
            scope: resolution.scope,
            reselect_required: resolution.reselect_required,
        })
    }

    /// Persiste a seleção. Só faculdades liberadas (ou qualquer uma para o Super Admin).
    pub async fn select_faculty(&self, principal: &Principal, faculty_id: Uuid) -> Result<FacultyScope, AppError> {
        if !principal.can(Capability::SelectFaculty) {
            return Err(AppError::ForbiddenScope);
        }

        if principal.can(Capability::BypassScope) {
            self.faculty_repo
                .find_faculty(faculty_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound(format!("Faculty {}", faculty_id)))?;
        } else if !principal.is_granted(faculty_id) {
            tracing::warn!(user_id = %principal.id(), %faculty_id, "Seleção de faculdade negada");
            return Err(AppError::ForbiddenScope);
        }

        self.faculty_repo.save_selection(&self.pool, principal.id(), faculty_id).await?;
        tracing::info!(user_id = %principal.id(), %faculty_id, "Faculdade selecionada");

        Ok(resolve_scope(principal.role(), Some(faculty_id), &principal.faculty_ids).scope)
    }

    pub async fn clear_selection(&self, principal: &Principal) -> Result<(), AppError> {
        self.faculty_repo.clear_selection(&self.pool, principal.id()).await
    }

    pub async fn selection_view(
        &self,
        principal: &Principal,
        resolved: &ResolvedScope,
    ) -> Result<FacultySelectionView, AppError> {
        let faculties = if principal.can(Capability::BypassScope) {
            self.faculty_repo.list_faculties(None).await?
        } else if principal.can(Capability::SelectFaculty) {
            self.faculty_repo.list_faculties(Some(&principal.faculty_ids)).await?
        } else {
            Vec::new()
        };

        Ok(FacultySelectionView {
            selected_faculty_id: resolved.scope.faculty_id(),
            reselect_required: resolved.reselect_required,
            faculties,
        })
    }

    // --- GRANTS (Super Admin) ---

    pub async fn grant_faculty(&self, user_id: Uuid, faculty_id: Uuid) -> Result<(), AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("User {}", user_id)))?;
        self.faculty_repo
            .find_faculty(faculty_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Faculty {}", faculty_id)))?;

        self.faculty_repo.grant(&self.pool, user_id, faculty_id).await?;
        tracing::info!(%user_id, %faculty_id, "Acesso à faculdade concedido");
        Ok(())
    }

    /// A seleção antiga é invalidada na próxima resolução de escopo.
    pub async fn revoke_faculty(&self, user_id: Uuid, faculty_id: Uuid) -> Result<(), AppError> {
        let removed = self.faculty_repo.revoke(&self.pool, user_id, faculty_id).await?;
        if !removed {
            return Err(AppError::ResourceNotFound(format!("Grant {}/{}", user_id, faculty_id)));
        }
        tracing::info!(%user_id, %faculty_id, "Acesso à faculdade revogado");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn super_admin_always_gets_all() {
        let (a, b) = ids();
        for selected in [None, Some(a), Some(b)] {
            let r = resolve_scope(Role::SuperAdmin, selected, &[]);
            assert_eq!(r.scope, FacultyScope::All);
            assert!(!r.reselect_required);
            assert!(!r.invalidate_selection);
        }
    }

    #[test]
    fn granted_selection_becomes_specific() {
        let (a, b) = ids();
        for role in [Role::Admin, Role::Dekan, Role::Dosen] {
            let r = resolve_scope(role, Some(a), &[b, a]);
            assert_eq!(r.scope, FacultyScope::Specific(a));
            assert!(!r.reselect_required);
        }
    }

    #[test]
    fn missing_selection_requires_reselect() {
        let (a, _) = ids();
        let r = resolve_scope(Role::Admin, None, &[a]);
        assert_eq!(r.scope, FacultyScope::None);
        assert!(r.reselect_required);
        assert!(!r.invalidate_selection);
    }

    #[test]
    fn revoked_selection_is_invalidated() {
        let (a, b) = ids();
        let r = resolve_scope(Role::Dekan, Some(a), &[b]);
        assert_eq!(r.scope, FacultyScope::None);
        assert!(r.reselect_required);
        assert!(r.invalidate_selection);
    }

    #[test]
    fn students_are_never_scoped_by_selection() {
        let (a, _) = ids();
        let r = resolve_scope(Role::Mahasiswa, Some(a), &[a]);
        assert_eq!(r.scope, FacultyScope::None);
        assert!(!r.reselect_required);

        let resolved = ResolvedScope { role: Role::Mahasiswa, scope: r.scope, reselect_required: false };
        assert_eq!(resolved.listing_filter().unwrap(), None);
        assert!(matches!(resolved.ensure_covers(a), Err(AppError::ForbiddenScope)));
    }

    #[test]
    fn listing_filter_follows_scope() {
        let (a, b) = ids();
        let all = ResolvedScope { role: Role::SuperAdmin, scope: FacultyScope::All, reselect_required: false };
        assert_eq!(all.listing_filter().unwrap(), None);

        let specific = ResolvedScope { role: Role::Admin, scope: FacultyScope::Specific(a), reselect_required: false };
        assert_eq!(specific.listing_filter().unwrap(), Some(a));
        assert!(specific.ensure_covers(a).is_ok());
        assert!(matches!(specific.ensure_covers(b), Err(AppError::ForbiddenScope)));

        let unresolved = ResolvedScope { role: Role::Admin, scope: FacultyScope::None, reselect_required: true };
        assert!(matches!(unresolved.listing_filter(), Err(AppError::FacultySelectionRequired)));
        assert!(matches!(unresolved.ensure_covers(a), Err(AppError::FacultySelectionRequired)));
    }

    #[test]
    fn scope_serializes_with_kind_tag() {
        let id = Uuid::nil();
        let json = serde_json::to_value(FacultyScope::Specific(id)).unwrap();
        assert_eq!(json["kind"], "specific");
        assert_eq!(json["facultyId"], id.to_string());
        assert_eq!(serde_json::to_value(FacultyScope::All).unwrap()["kind"], "all");
    }
}
