// src/main.rs

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

// Folga para os campos de texto do multipart além dos três arquivos
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;
    let bind_addr = app_state.config.bind_addr.clone();
    let body_limit = app_state.config.max_upload_bytes * 3 + MULTIPART_OVERHEAD;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas
    let public_routes = Router::new().route("/auth/login", post(handlers::auth::login));

    // Rotas protegidas (auth_guard injeta o AuthenticatedUser)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/{user_id}/faculties", post(handlers::faculty::grant_faculty))
        .route(
            "/{user_id}/faculties/{faculty_id}",
            axum::routing::delete(handlers::faculty::revoke_faculty),
        );

    let scope_routes = Router::new()
        .route(
            "/faculty-selection",
            get(handlers::faculty::get_selection)
                .post(handlers::faculty::select_faculty)
                .delete(handlers::faculty::clear_selection),
        )
        .route(
            "/faculties",
            get(handlers::faculty::list_faculties).post(handlers::faculty::create_faculty),
        )
        .route(
            "/buildings",
            get(handlers::faculty::list_buildings).post(handlers::faculty::create_building),
        )
        .route(
            "/room-categories",
            get(handlers::faculty::list_room_categories).post(handlers::faculty::create_room_category),
        );

    let inventory_routes = Router::new()
        .route(
            "/facilities",
            get(handlers::facilities::list_facilities).post(handlers::facilities::create_facility),
        )
        .route("/facilities/ensure", post(handlers::facilities::ensure_facility))
        .route("/facilities/{facility_id}", put(handlers::facilities::update_facility))
        .route(
            "/rooms",
            get(handlers::rooms::list_rooms).post(handlers::rooms::create_room),
        )
        .route(
            "/rooms/{room_id}",
            get(handlers::rooms::get_room)
                .put(handlers::rooms::update_room)
                .delete(handlers::rooms::delete_room),
        )
        .route("/rooms/{room_id}/facilities", put(handlers::rooms::sync_room_facilities))
        .route("/rooms/{room_id}/image", post(handlers::rooms::upload_room_image));

    let booking_routes = Router::new()
        .route(
            "/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::submit_booking),
        )
        .route("/bookings/mine", get(handlers::bookings::list_my_bookings))
        .route("/bookings/{booking_id}", get(handlers::bookings::get_booking))
        .route("/bookings/{booking_id}/approve", post(handlers::bookings::approve_booking))
        .route("/bookings/{booking_id}/reject", post(handlers::bookings::reject_booking))
        .route("/document-types", get(handlers::bookings::list_document_types))
        .route("/calendar/events", get(handlers::calendar::list_events))
        .route(
            "/maintenance",
            get(handlers::maintenance::list_maintenance).post(handlers::maintenance::create_maintenance),
        )
        .route(
            "/maintenance/{maintenance_id}/status",
            patch(handlers::maintenance::update_maintenance_status),
        );

    let api_routes = Router::new()
        .nest("/users", user_routes)
        .merge(scope_routes)
        .merge(inventory_routes)
        .merge(booking_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard))
        .merge(public_routes);

    // Combina tudo no router principal
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {bind_addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
