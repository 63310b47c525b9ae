//! Signup, login and token refresh.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{sign_token, verify_token};
use crate::config::Config;
use crate::models::user::{Role, SafeUser, User};
use crate::store::{Store, StoreError};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub user: SafeUser,
    pub access_token: String,
    pub refresh_token: String,
}

fn issue_tokens(config: &Config, user: &User) -> Result<(String, String), AppError> {
    let access = sign_token(
        user.id,
        user.role,
        &config.access_token_secret,
        config.access_token_ttl_secs,
    )?;
    let refresh = sign_token(
        user.id,
        user.role,
        &config.refresh_token_secret,
        config.refresh_token_ttl_secs,
    )?;
    Ok((access, refresh))
}

pub async fn signup(
    store: &dyn Store,
    config: &Config,
    input: SignupInput,
) -> Result<AuthSession, AppError> {
    let first_name = input.first_name.trim().to_string();
    let last_name = input.last_name.trim().to_string();
    let email = input.email.trim().to_lowercase();
    if first_name.is_empty() || last_name.is_empty() || email.is_empty() || input.password.is_empty()
    {
        return Err(AppError::MissingRequiredField(
            "Missing required fields".into(),
        ));
    }
    if !email.contains('@') {
        return Err(AppError::ValidationError("Invalid email".into()));
    }

    // Only guest/owner accounts can be created through the API.
    let role = match input.role.as_deref() {
        Some("owner") => Role::Owner,
        _ => Role::Guest,
    };

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(input.password.as_bytes(), &salt)
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("password hashing failed: {e}")))?
        .to_string();

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        first_name,
        last_name,
        email,
        phone: input.phone.as_deref().map(str::trim).map(str::to_string),
        password_hash,
        role,
        created_at: now,
        updated_at: now,
    };

    let user = store.insert_user(user).await.map_err(|e| match e {
        StoreError::Duplicate(_) => AppError::DuplicateKey("Email already exists".into()),
        other => other.into(),
    })?;

    let (access_token, refresh_token) = issue_tokens(config, &user)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user signed up");
    Ok(AuthSession {
        user: user.to_safe(),
        access_token,
        refresh_token,
    })
}

pub async fn login(
    store: &dyn Store,
    config: &Config,
    input: LoginInput,
) -> Result<AuthSession, AppError> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::MissingRequiredField(
            "Email and password are required".into(),
        ));
    }

    // Every failure below is reported identically: no account probing.
    let user = store
        .find_user_by_email(&input.email.trim().to_lowercase())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if let Some(role) = input.role.as_deref() {
        if Role::parse(role) != Some(user.role) {
            return Err(AppError::InvalidCredentials);
        }
    }

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(input.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::InvalidCredentials)?;

    let (access_token, refresh_token) = issue_tokens(config, &user)?;
    Ok(AuthSession {
        user: user.to_safe(),
        access_token,
        refresh_token,
    })
}

/// Verifies the refresh token and rotates both tokens.
pub async fn refresh(
    store: &dyn Store,
    config: &Config,
    refresh_token: &str,
) -> Result<AuthSession, AppError> {
    if refresh_token.is_empty() {
        return Err(AppError::AuthError("Missing refresh token".into()));
    }

    let claims = verify_token(refresh_token, &config.refresh_token_secret)
        .map_err(|_| AppError::AuthError("Invalid refresh token".into()))?;

    let user = store
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::AuthError("User not found".into()))?;

    let (access_token, refresh_token) = issue_tokens(config, &user)?;
    Ok(AuthSession {
        user: user.to_safe(),
        access_token,
        refresh_token,
    })
}
