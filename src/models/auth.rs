// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::rbac::{Capability, Role};

// Usuário como vem do banco (JOIN com roles para trazer o slug do papel)
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "Siti Rahma")]
    pub name: String,
    #[schema(example = "siti@kampus.ac.id")]
    pub email: String,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,

    #[schema(ignore)]
    pub role_id: i16,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Usuário autenticado + faculdades às quais tem acesso.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    pub faculty_ids: Vec<Uuid>,
}

impl Principal {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.user.role.can(capability)
    }

    pub fn is_granted(&self, faculty_id: Uuid) -> bool {
        self.faculty_ids.contains(&faculty_id)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "validation.email"))]
    #[schema(example = "admin@kampus.ac.id")]
    pub email: String,
    #[validate(length(min = 6, message = "validation.password_length"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Dados do perfil devolvidos em /me
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub capabilities: Vec<Capability>,
    pub faculty_ids: Vec<Uuid>,
}

// "Claims" do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}
