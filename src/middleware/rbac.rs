// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::Capability,
};

/// 1. Uma capacidade exigida pela rota
pub trait CapabilityDef: Send + Sync + 'static {
    fn capability() -> Capability;
}

/// 2. O Extractor (Guardião): consulta a tabela de capacidades do papel
pub struct RequireCapability<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(principal) = AuthenticatedUser::from_request_parts(parts, state).await?;

        let required = T::capability();
        if !principal.can(required) {
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_header(
                parts
                    .headers
                    .get(axum::http::header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok()),
            );
            tracing::warn!(user_id = %principal.id(), role = ?principal.role(), capability = required.slug(), "Capacidade negada");
            return Err(AppError::MissingCapability(required.slug()).to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireCapability(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS CAPACIDADES (TIPOS)
// ---

pub struct CapSubmitBooking;
impl CapabilityDef for CapSubmitBooking {
    fn capability() -> Capability { Capability::SubmitBooking }
}

pub struct CapApproveBooking;
impl CapabilityDef for CapApproveBooking {
    fn capability() -> Capability { Capability::ApproveBooking }
}

pub struct CapManageRooms;
impl CapabilityDef for CapManageRooms {
    fn capability() -> Capability { Capability::ManageRooms }
}

pub struct CapSelectFaculty;
impl CapabilityDef for CapSelectFaculty {
    fn capability() -> Capability { Capability::SelectFaculty }
}

pub struct CapBypassScope;
impl CapabilityDef for CapBypassScope {
    fn capability() -> Capability { Capability::BypassScope }
}
