use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::booking::{BookingStatus, ConflictMode},
};

// Erro único da camada de serviço. Os handlers o traduzem em ApiError.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    #[error("Conflito de horário ({0:?})")]
    SchedulingConflict(ConflictMode),

    #[error("Transição inválida de {from:?} para {to:?}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("Fora do escopo de faculdade do usuário")]
    ForbiddenScope,

    #[error("É necessário selecionar uma faculdade")]
    FacultySelectionRequired,

    #[error("Capacidade ausente: {0}")]
    MissingCapability(&'static str),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Referência inexistente: {0}")]
    DanglingReference(String),

    #[error("Recurso em uso: {0}")]
    ResourceInUse(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta desativada")]
    AccountInactive,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Monta um `ValidationError` de um único campo (validações feitas no serviço).
pub fn field_error(field: &'static str, code: &'static str, message_key: &'static str) -> AppError {
    let mut error = ValidationError::new(code);
    error.message = Some(message_key.into());
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    AppError::ValidationError(errors)
}

// Resposta de erro enviada ao cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::SchedulingConflict(_)
            | AppError::InvalidTransition { .. }
            | AppError::ResourceInUse(_)
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::ForbiddenScope | AppError::MissingCapability(_) | AppError::AccountInactive => {
                StatusCode::FORBIDDEN
            }
            AppError::FacultySelectionRequired => StatusCode::PRECONDITION_REQUIRED,
            AppError::ResourceNotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DanglingReference(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave do catálogo de mensagens.
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "error.validation",
            AppError::SchedulingConflict(ConflictMode::Submission) => "booking.conflict_submission",
            AppError::SchedulingConflict(ConflictMode::Approval) => "booking.conflict_approval",
            AppError::InvalidTransition { .. } => "booking.invalid_transition",
            AppError::ForbiddenScope => "scope.forbidden",
            AppError::FacultySelectionRequired => "scope.reselect",
            AppError::MissingCapability(_) => "auth.missing_capability",
            AppError::ResourceNotFound(_) => "error.not_found",
            AppError::ResourceInUse(_) => "error.in_use",
            AppError::UniqueConstraintViolation(_) => "error.unique",
            AppError::InvalidCredentials => "auth.invalid_credentials",
            AppError::InvalidToken => "auth.invalid_token",
            AppError::AccountInactive => "auth.inactive",
            AppError::UserNotFound => "auth.user_not_found",
            AppError::DanglingReference(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "error.internal",
        }
    }

    /// Converte para a resposta HTTP no idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status_code();
        let error = i18n.translate(&locale.0, self.message_key()).to_string();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro interno do servidor: {}", self);
        }

        let details = match &self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(key) => i18n.translate(&locale.0, key).to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::MissingCapability(slug) => Some(json!({ "capability": slug })),
            AppError::InvalidTransition { from, .. } => Some(json!({ "currentStatus": from.as_str() })),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn conflict_maps_to_409() {
        let api = AppError::SchedulingConflict(ConflictMode::Approval).to_api_error(&en(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert!(api.error.contains("approved"));
    }

    #[test]
    fn forbidden_scope_does_not_leak_details() {
        let api = AppError::ForbiddenScope.to_api_error(&en(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::FORBIDDEN);
        assert!(api.details.is_none());
    }

    #[test]
    fn dangling_reference_is_a_generic_failure() {
        let api = AppError::DanglingReference("facility 42".into()).to_api_error(&en(), &I18nStore::new());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("42"));
    }

    #[test]
    fn validation_details_are_translated_per_field() {
        let err = field_error("end_time", "time_window", "validation.time_window");
        let api = err.to_api_error(&Locale("id".to_string()), &I18nStore::new());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);

        let details = api.details.expect("details");
        let messages = details["end_time"].as_array().expect("array");
        assert_eq!(messages.len(), 1);
        assert_ne!(messages[0].as_str(), Some("validation.time_window"));
    }

    #[test]
    fn reselect_uses_precondition_required() {
        assert_eq!(AppError::FacultySelectionRequired.status_code(), StatusCode::PRECONDITION_REQUIRED);
    }
}
