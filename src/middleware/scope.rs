// src/middleware/scope.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    services::scope_service::ResolvedScope,
};

/// Escopo de faculdade da requisição, resolvido a partir do usuário
/// autenticado e da seleção persistida.
#[derive(Debug, Clone, Copy)]
pub struct RequestScope(pub ResolvedScope);

impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let AuthenticatedUser(principal) = AuthenticatedUser::from_request_parts(parts, state).await?;

        let resolved = app_state.scope_service.resolve(&principal).await.map_err(|e| {
            let locale = Locale::from_header(
                parts
                    .headers
                    .get(axum::http::header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok()),
            );
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

        Ok(RequestScope(resolved))
    }
}
