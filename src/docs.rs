// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Faculty Scope ---
        handlers::faculty::get_selection,
        handlers::faculty::select_faculty,
        handlers::faculty::clear_selection,
        handlers::faculty::grant_faculty,
        handlers::faculty::revoke_faculty,

        // --- Faculties ---
        handlers::faculty::list_faculties,
        handlers::faculty::create_faculty,
        handlers::faculty::list_buildings,
        handlers::faculty::create_building,
        handlers::faculty::list_room_categories,
        handlers::faculty::create_room_category,

        // --- Facilities ---
        handlers::facilities::list_facilities,
        handlers::facilities::create_facility,
        handlers::facilities::ensure_facility,
        handlers::facilities::update_facility,

        // --- Rooms ---
        handlers::rooms::list_rooms,
        handlers::rooms::get_room,
        handlers::rooms::create_room,
        handlers::rooms::update_room,
        handlers::rooms::sync_room_facilities,
        handlers::rooms::delete_room,
        handlers::rooms::upload_room_image,

        // --- Bookings ---
        handlers::bookings::submit_booking,
        handlers::bookings::list_my_bookings,
        handlers::bookings::list_bookings,
        handlers::bookings::get_booking,
        handlers::bookings::approve_booking,
        handlers::bookings::reject_booking,
        handlers::bookings::list_document_types,

        // --- Calendar ---
        handlers::calendar::list_events,

        // --- Maintenance ---
        handlers::maintenance::create_maintenance,
        handlers::maintenance::list_maintenance,
        handlers::maintenance::update_maintenance_status,
    ),
    components(
        schemas(
            // --- Auth ---
            models::rbac::Role,
            models::rbac::Capability,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::MeResponse,

            // --- Faculties ---
            models::faculty::Faculty,
            models::faculty::Building,
            models::faculty::RoomCategory,
            models::faculty::FacultySelectionView,
            handlers::faculty::SelectFacultyPayload,
            handlers::faculty::CreateNamedPayload,
            handlers::faculty::CreateBuildingPayload,
            handlers::faculty::GrantFacultyPayload,

            // --- Facilities ---
            models::facility::FacilityUnit,
            models::facility::Facility,
            models::facility::RoomFacility,
            models::facility::RoomFacilityEntry,
            models::facility::FacilityAssignment,
            handlers::facilities::CreateFacilityPayload,
            handlers::facilities::UpdateFacilityPayload,
            handlers::facilities::EnsureFacilityPayload,

            // --- Rooms ---
            models::room::RoomStatus,
            models::room::Room,
            models::room::RoomSummary,
            models::room::RoomDetail,
            handlers::rooms::RoomPayload,
            handlers::rooms::SyncFacilitiesPayload,

            // --- Bookings ---
            models::booking::BookingStatus,
            models::booking::Booking,
            models::booking::BookingSummary,
            models::booking::BookingDetail,
            models::booking::BookingDocument,
            models::booking::DocumentType,
            handlers::bookings::SubmitBookingForm,
            handlers::bookings::ApproveBookingPayload,
            handlers::bookings::RejectBookingPayload,

            // --- Calendar ---
            models::calendar::EventKind,
            models::calendar::CalendarEvent,
            models::calendar::CalendarFeed,

            // --- Maintenance ---
            models::maintenance::MaintenanceStatus,
            models::maintenance::MaintenanceLog,
            handlers::maintenance::CreateMaintenancePayload,
            handlers::maintenance::UpdateMaintenanceStatusPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Faculty Scope", description = "Seleção de faculdade e acessos"),
        (name = "Faculties", description = "Faculdades, Prédios e Categorias de Sala"),
        (name = "Facilities", description = "Catálogo de Facilidades"),
        (name = "Rooms", description = "Salas e suas Facilidades"),
        (name = "Bookings", description = "Solicitação e Aprovação de Reservas"),
        (name = "Calendar", description = "Agenda de Reservas e Manutenções"),
        (name = "Maintenance", description = "Janelas de Manutenção das Salas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
