use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::booking::ConflictMode,
    services::scope_service::FacultyScope,
};

// ---
// Helper de transação: identifica o ator e o escopo no banco
// ---
/// Abre uma transação e grava `app.user_id` / `app.faculty_id` como
/// configurações locais da transação (somem no commit/rollback).
pub(crate) async fn begin_scoped_tx(
    pool: &PgPool,
    user_id: Uuid,
    scope: &FacultyScope,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

    let faculty = scope.faculty_id().map(|id| id.to_string()).unwrap_or_default();
    sqlx::query("SELECT set_config('app.faculty_id', $1, true)")
        .bind(faculty)
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}

const EXCLUSION_VIOLATION: &str = "23P01";

/// Converte violações de constraint em erros de domínio.
pub(crate) fn map_db_error(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        let constraint = db_err.constraint().unwrap_or("desconhecida").to_string();

        if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
            return AppError::SchedulingConflict(ConflictMode::Approval);
        }
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return AppError::DanglingReference(constraint);
        }
    }
    AppError::DatabaseError(e)
}
