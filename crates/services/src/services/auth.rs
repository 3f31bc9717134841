use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use db::{
    DbErr, DbPool,
    models::user::{User, UserRef},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils_jwt::{JwtError, TokenSigner};

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
const DEV_JWT_SECRET: &str = "dev_secret_change_me";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error("User no longer exists")]
    UnknownUser,
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Clone, Deserialize, TS)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserRef,
}

/// Reads `JWT_SECRET`, falling back to a development secret.
pub fn jwt_secret_from_env() -> SecretString {
    match std::env::var(JWT_SECRET_ENV) {
        Ok(secret) if !secret.trim().is_empty() => SecretString::from(secret),
        _ => {
            tracing::warn!(
                "{} is not set; using the development secret. Do not run like this in production.",
                JWT_SECRET_ENV
            );
            SecretString::from(DEV_JWT_SECRET)
        }
    }
}

pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hash(err.to_string()))
}

pub fn verify_password(plain: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!("Stored password hash is malformed: {}", err);
            false
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthService {
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            signer: TokenSigner::new(secret.expose_secret().as_bytes()),
        }
    }

    pub async fn login(&self, pool: &DbPool, request: &LoginRequest) -> Result<LoginResponse> {
        let username = request
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let password = request.password.as_deref().filter(|p| !p.is_empty());
        let (Some(username), Some(password)) = (username, password) else {
            return Err(AuthError::Validation(
                "username and password are required".to_string(),
            ));
        };

        let Some(credentials) = User::find_credentials_by_username(pool, username).await? else {
            tracing::warn!(username, "Login rejected: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        let password = password.to_string();
        let password_hash = credentials.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(|err| AuthError::Hash(err.to_string()))?;
        if !verified {
            tracing::warn!(username, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let user = credentials.user.to_ref();
        let token = self.signer.issue(user.id, &user.username)?;
        tracing::info!(username = %user.username, "User logged in");
        Ok(LoginResponse { token, user })
    }

    /// Resolves a bearer token to a still-existing user.
    pub async fn authenticate(&self, pool: &DbPool, token: &str) -> Result<UserRef> {
        let claims = self.signer.verify(token)?;
        let user = User::find_by_id(pool, claims.sub)
            .await?
            .ok_or(AuthError::UnknownUser)?;
        Ok(user.to_ref())
    }

    pub fn issue_token(&self, user: &UserRef) -> Result<String> {
        Ok(self.signer.issue(user.id, &user.username)?)
    }
}
