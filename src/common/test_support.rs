// src/common/test_support.rs
//
// Apoio aos testes que precisam de Postgres. Sem DATABASE_URL eles
// retornam cedo, sem falhar.

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{auth::Principal, rbac::Role},
    services::{
        scope_service::{FacultyScope, ResolvedScope},
        storage::{DocumentStorage, StoredFile},
    },
};

/// Pool já migrado, ou `None` quando não há banco configurado.
pub async fn pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL ausente: teste de banco pulado");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(16)
        .connect(&url)
        .await
        .expect("conexão com o banco de teste");
    sqlx::migrate!().run(&pool).await.expect("migrações do banco de teste");
    Some(pool)
}

/// Sufixo único por execução (os testes compartilham o banco).
pub fn unique(label: &str) -> String {
    format!("{label} {}", Uuid::new_v4().simple())
}

/// Faculdade -> prédio -> sala, mais um admin com acesso e um estudante.
pub struct RoomFixture {
    pub faculty_id: Uuid,
    pub room_id: Uuid,
    pub admin: Principal,
    pub student: Principal,
}

impl RoomFixture {
    pub fn admin_scope(&self) -> ResolvedScope {
        ResolvedScope { role: Role::Admin, scope: FacultyScope::Specific(self.faculty_id), reselect_required: false }
    }

    pub fn student_scope(&self) -> ResolvedScope {
        ResolvedScope { role: Role::Mahasiswa, scope: FacultyScope::None, reselect_required: false }
    }
}

pub async fn seed_room(pool: &PgPool, capacity: i32) -> RoomFixture {
    let faculty_id: Uuid = sqlx::query_scalar("INSERT INTO faculties (name) VALUES ($1) RETURNING id")
        .bind(unique("Fakultas Teknik"))
        .fetch_one(pool)
        .await
        .expect("faculty");
    let building_id: Uuid =
        sqlx::query_scalar("INSERT INTO buildings (faculty_id, name) VALUES ($1, 'Gedung A') RETURNING id")
            .bind(faculty_id)
            .fetch_one(pool)
            .await
            .expect("building");
    let category_id: Uuid = sqlx::query_scalar("INSERT INTO room_categories (name) VALUES ($1) RETURNING id")
        .bind(unique("Ruang Kelas"))
        .fetch_one(pool)
        .await
        .expect("category");
    let room_id: Uuid = sqlx::query_scalar(
        "INSERT INTO rooms (building_id, category_id, code, name, capacity) VALUES ($1, $2, $3, 'TK-101', $4) RETURNING id",
    )
    .bind(building_id)
    .bind(category_id)
    .bind(unique("TK-101"))
    .bind(capacity)
    .fetch_one(pool)
    .await
    .expect("room");

    let admin = seed_user(pool, "admin", Some(faculty_id)).await;
    let student = seed_user(pool, "mahasiswa", None).await;

    RoomFixture { faculty_id, room_id, admin, student }
}

async fn seed_user(pool: &PgPool, role: &str, faculty_id: Option<Uuid>) -> Principal {
    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (name, email, password_hash, role_id)
        VALUES ($1, $2, 'x', (SELECT id FROM roles WHERE slug = $3::user_role))
        RETURNING id
        "#,
    )
    .bind(format!("Pengguna {role}"))
    .bind(format!("{}@kampus.ac.id", Uuid::new_v4().simple()))
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("user");

    if let Some(faculty_id) = faculty_id {
        sqlx::query("INSERT INTO user_faculties (user_id, faculty_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(faculty_id)
            .execute(pool)
            .await
            .expect("grant");
    }

    let user = UserRepository::new(pool.clone())
        .find_by_id(user_id)
        .await
        .expect("select user")
        .expect("user row");
    Principal { user, faculty_ids: faculty_id.into_iter().collect() }
}

/// Armazenamento em memória que registra gravações/remoções e pode
/// falhar na N-ésima gravação.
#[derive(Default)]
pub struct RecordingStorage {
    fail_on_store: Option<usize>,
    path_prefix: String,
    stored: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

impl RecordingStorage {
    pub fn failing_on(nth: usize) -> Self {
        Self { fail_on_store: Some(nth), ..Self::default() }
    }

    pub fn with_path_prefix(prefix: &str) -> Self {
        Self { path_prefix: prefix.to_string(), ..Self::default() }
    }

    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStorage for RecordingStorage {
    async fn store(&self, folder: &str, original_filename: &str, _bytes: &[u8]) -> Result<StoredFile, AppError> {
        let mut stored = self.stored.lock().unwrap();
        if self.fail_on_store == Some(stored.len() + 1) {
            return Err(anyhow::anyhow!("disco cheio").into());
        }
        let path = format!("{}{}/{}-{}", self.path_prefix, folder, stored.len(), original_filename);
        stored.push(path.clone());
        Ok(StoredFile { path })
    }

    async fn remove(&self, path: &str) -> Result<(), AppError> {
        self.removed.lock().unwrap().push(path.to_string());
        Ok(())
    }
}
