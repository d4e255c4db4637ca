use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio::task;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::auth::{self, Role};
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterRequest, User};
use crate::AppState;

const MIN_USERNAME_CHARS: usize = 3;

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn is_reasonable_email(email: &str) -> bool {
    if email.len() < 5 || email.len() > 254 {
        return false;
    }
    let mut parts = email.split('@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    parts.next().is_none()
        && !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn cookie_response(
    status: StatusCode,
    cookie: String,
    body: serde_json::Value,
) -> Result<Response, ApiError> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&cookie)
        .map_err(|_| ApiError::Internal("invalid cookie header".to_string()))?;
    headers.insert(SET_COOKIE, value);
    Ok((status, headers, Json(body)).into_response())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let (Some(username), Some(email), Some(password)) =
        (payload.username, payload.email, payload.password)
    else {
        return Err(ApiError::Validation("All fields are required".to_string()));
    };

    let username = username.trim().to_string();
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Err(ApiError::Validation(
            "Username must be at least 3 characters".to_string(),
        ));
    }

    let email = normalize_email(&email);
    if !is_reasonable_email(&email) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    let role = match payload.role {
        Some(raw) => Role::try_from(raw)
            .map_err(|_| ApiError::Validation("Invalid role".to_string()))?,
        None => Role::User,
    };

    tracing::info!("Register request received for email: {}", email);

    let existing: Option<(uuid::Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_some() {
        return Err(ApiError::Validation("User already exists".to_string()));
    }

    let password_hash = task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|_| ApiError::Internal("password hashing worker failed".to_string()))?
    .map_err(|_| ApiError::Internal("password hashing failed".to_string()))?;

    let inserted: (uuid::Uuid,) = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .bind(role.as_str())
    .fetch_one(&state.db)
    .await?;

    let user_id = inserted.0;
    tracing::info!("User registered: {} ({})", email, user_id);

    let token = auth::create_jwt(user_id, role, &state.jwt_secret);
    cookie_response(
        StatusCode::CREATED,
        auth::build_auth_cookie(&token, state.cookie_secure),
        serde_json::json!({ "message": "User registered successfully" }),
    )
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    };

    let email = normalize_email(&email);
    if !is_reasonable_email(&email) || password.is_empty() || password.len() > 128 {
        return Err(ApiError::Validation(
            "Invalid email or password".to_string(),
        ));
    }

    let user: Option<User> = sqlx::query_as(
        "SELECT id, username, email, password_hash, role, created_at FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&state.db)
    .await?;

    let Some(user) = user else {
        return Err(ApiError::Validation(
            "Invalid email or password".to_string(),
        ));
    };

    let hash = user.password_hash.clone();
    let is_valid = task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    })
    .await
    .map_err(|_| ApiError::Internal("password verification worker failed".to_string()))?;

    if !is_valid {
        return Err(ApiError::Validation(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!("Login successful for user {}", user.id);

    let token = auth::create_jwt(user.id, user.role, &state.jwt_secret);
    cookie_response(
        StatusCode::OK,
        auth::build_auth_cookie(&token, state.cookie_secure),
        serde_json::json!({ "message": "Login successful" }),
    )
}

pub async fn logout(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    cookie_response(
        StatusCode::OK,
        auth::clear_auth_cookie(state.cookie_secure),
        serde_json::json!({ "message": "Logged out successfully" }),
    )
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let ctx = auth::authenticate(&headers, &state)?;

    let user: Option<User> = sqlx::query_as(
        "SELECT id, username, email, password_hash, role, created_at FROM users WHERE id = $1",
    )
    .bind(ctx.user_id)
    .fetch_optional(&state.db)
    .await?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    // password_hash is skipped by the User serializer.
    Ok((StatusCode::OK, Json(user)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_reasonable_email("user@example.com"));
        assert!(is_reasonable_email("a.b+c@sub.domain.org"));
    }

    #[test]
    fn email_validation_rejects_malformed_addresses() {
        assert!(!is_reasonable_email("userexample.com"));
        assert!(!is_reasonable_email("user@domain"));
        assert!(!is_reasonable_email("user@.domain.com"));
        assert!(!is_reasonable_email("user@domain.com."));
        assert!(!is_reasonable_email("a@b@c.com"));
        assert!(!is_reasonable_email("a@b"));
    }

    #[test]
    fn emails_normalize_to_lowercase() {
        assert_eq!(normalize_email("  USER@Example.COM "), "user@example.com");
    }
}
