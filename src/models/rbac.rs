// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---
// Papéis (fixos, espelham o enum `user_role` do banco)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Dekan,
    Dosen,
    Mahasiswa,
}

// ---
// Capacidades: o que cada papel pode fazer
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    SubmitBooking,
    ApproveBooking,
    ManageRooms,
    SelectFaculty,
    BypassScope,
}

impl Capability {
    pub fn slug(self) -> &'static str {
        match self {
            Capability::SubmitBooking => "submit-booking",
            Capability::ApproveBooking => "approve-booking",
            Capability::ManageRooms => "manage-rooms",
            Capability::SelectFaculty => "select-faculty",
            Capability::BypassScope => "bypass-scope",
        }
    }
}

use Capability::*;

const SUPER_ADMIN_CAPS: &[Capability] = &[
    SubmitBooking,
    ApproveBooking,
    ManageRooms,
    SelectFaculty,
    BypassScope,
];
const ADMIN_CAPS: &[Capability] = &[SubmitBooking, ApproveBooking, ManageRooms, SelectFaculty];
const STAFF_CAPS: &[Capability] = &[SubmitBooking, ApproveBooking, SelectFaculty];
const STUDENT_CAPS: &[Capability] = &[SubmitBooking];

impl Role {
    /// Tabela de permissões por papel.
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::SuperAdmin => SUPER_ADMIN_CAPS,
            Role::Admin => ADMIN_CAPS,
            Role::Dekan | Role::Dosen => STAFF_CAPS,
            Role::Mahasiswa => STUDENT_CAPS,
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Admin/Dekan/Dosen (e o Super Admin) revisam reservas.
    pub fn is_admin_tier(self) -> bool {
        self.can(Capability::ApproveBooking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_super_admin_bypasses_scope() {
        assert!(Role::SuperAdmin.can(BypassScope));
        for role in [Role::Admin, Role::Dekan, Role::Dosen, Role::Mahasiswa] {
            assert!(!role.can(BypassScope), "{role:?} must not bypass scope");
        }
    }

    #[test]
    fn students_only_submit() {
        assert_eq!(Role::Mahasiswa.capabilities(), &[SubmitBooking]);
        assert!(!Role::Mahasiswa.is_admin_tier());
        assert!(!Role::Mahasiswa.can(SelectFaculty));
    }

    #[test]
    fn admin_tier_roles_review_bookings() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Dekan, Role::Dosen] {
            assert!(role.is_admin_tier());
        }
    }

    #[test]
    fn room_management_is_restricted_to_admins() {
        assert!(Role::Admin.can(ManageRooms));
        assert!(Role::SuperAdmin.can(ManageRooms));
        assert!(!Role::Dekan.can(ManageRooms));
        assert!(!Role::Dosen.can(ManageRooms));
    }

    #[test]
    fn role_serializes_as_snake_case() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
        assert_eq!(Capability::ManageRooms.slug(), "manage-rooms");
    }
}
