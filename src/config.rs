// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        calendar_repo::CalendarRepository, BookingRepository, FacilityRepository, FacultyRepository,
        MaintenanceRepository, RoomRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        booking_service::BookingService,
        calendar_service::CalendarService,
        conflict_checker::ConflictChecker,
        facility_naming::KeywordNaming,
        facility_service::FacilityService,
        faculty_service::FacultyService,
        maintenance_service::MaintenanceService,
        room_service::RoomService,
        scope_service::ScopeService,
        storage::{DocumentStorage, LocalDiskStorage},
    },
};

/// Configuração lida do ambiente (.env).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub jwt_ttl_hours: i64,
}

fn var_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().with_context(|| format!("{key} inválida: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 5)?,
            upload_dir: var_or("UPLOAD_DIR", "./storage".to_string())?,
            max_upload_bytes: var_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            jwt_ttl_hours: var_or("JWT_TTL_HOURS", 168)?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub scope_service: ScopeService,
    pub faculty_service: FacultyService,
    pub facility_service: FacilityService,
    pub room_service: RoomService,
    pub booking_service: BookingService,
    pub maintenance_service: MaintenanceService,
    pub calendar_service: CalendarService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let storage: Arc<dyn DocumentStorage> = Arc::new(LocalDiskStorage::new(&config.upload_dir));

        let user_repo = UserRepository::new(db_pool.clone());
        let faculty_repo = FacultyRepository::new(db_pool.clone());
        let facility_repo = FacilityRepository::new(db_pool.clone());
        let room_repo = RoomRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());
        let maintenance_repo = MaintenanceRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            faculty_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
        );
        let scope_service = ScopeService::new(faculty_repo.clone(), user_repo, db_pool.clone());
        let faculty_service = FacultyService::new(faculty_repo.clone(), db_pool.clone());
        let facility_service = FacilityService::new(facility_repo.clone(), Arc::new(KeywordNaming), db_pool.clone());
        let room_service = RoomService::new(
            room_repo.clone(),
            faculty_repo,
            facility_repo,
            facility_service.clone(),
            storage.clone(),
            config.max_upload_bytes,
            db_pool.clone(),
        );
        let booking_service = BookingService::new(
            booking_repo.clone(),
            room_repo.clone(),
            ConflictChecker::new(booking_repo),
            storage,
            config.max_upload_bytes,
            db_pool.clone(),
        );
        let maintenance_service = MaintenanceService::new(maintenance_repo, room_repo, db_pool.clone());
        let calendar_service = CalendarService::new(CalendarRepository::new(), db_pool.clone());

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            auth_service,
            scope_service,
            faculty_service,
            facility_service,
            room_service,
            booking_service,
            maintenance_service,
            calendar_service,
        })
    }
}
