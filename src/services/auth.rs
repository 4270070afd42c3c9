// src/services/auth.rs

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FacultyRepository, UserRepository},
    models::auth::{Claims, Principal, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    faculty_repo: FacultyRepository,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, faculty_repo: FacultyRepository, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self { user_repo, faculty_repo, jwt_secret, token_ttl_hours }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // bcrypt é caro: roda fora do executor async
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::AccountInactive);
        }

        tracing::info!(user_id = %user.id, role = ?user.role, "Login efetuado");
        self.create_token(user.id)
    }

    /// Token -> usuário ativo + faculdades liberadas.
    pub async fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        let user = self.validate_token(token).await?;
        if !user.is_active {
            return Err(AppError::AccountInactive);
        }

        let faculty_ids = self.faculty_repo.granted_faculty_ids(user.id).await?;
        Ok(Principal { user, faculty_ids })
    }

    async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(self.token_ttl_hours);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
