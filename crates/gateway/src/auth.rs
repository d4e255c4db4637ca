use std::fmt;

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub const AUTH_COOKIE: &str = "token";
const TOKEN_TTL_HOURS: i64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(String);

impl TryFrom<String> for Role {
    type Error = RoleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

/// Identity attached to a request after the cookie checks out.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn create_jwt(user_id: Uuid, role: Role, secret: &str) -> String {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap_or_default()
}

pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get("cookie")?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name {
            return Some(value.to_string());
        }
    }
    None
}

pub fn build_auth_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Strict; HttpOnly",
        AUTH_COOKIE,
        token,
        TOKEN_TTL_HOURS * 60 * 60
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_auth_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; Max-Age=0; SameSite=Strict; HttpOnly", AUTH_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Verify the auth cookie and return who is calling. Absent, malformed and
/// expired tokens are all the same `Unauthorized` to the client.
pub fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AuthContext, ApiError> {
    let token = get_cookie_value(headers, AUTH_COOKIE).ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    Ok(AuthContext {
        user_id: token_data.claims.sub,
        role: token_data.claims.role,
    })
}

/// Role policy, separate from identity verification: a mismatch is a
/// `Forbidden`, never an `Unauthorized`.
pub fn authorize(ctx: &AuthContext, required: Role) -> Result<(), ApiError> {
    if ctx.role != required {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_value_is_found_among_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("a=1; token=abc.def.ghi; b=2"),
        );
        assert_eq!(
            get_cookie_value(&headers, AUTH_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn auth_cookie_carries_expected_attributes() {
        let cookie = build_auth_cookie("tok", false);
        assert!(cookie.starts_with("token=tok;"));
        assert!(cookie.contains("Max-Age=21600"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(!cookie.contains("Secure"));

        let secure = build_auth_cookie("tok", true);
        assert!(secure.ends_with("; Secure"));

        let cleared = clear_auth_cookie(false);
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn jwt_round_trips_subject_and_role() {
        let user_id = Uuid::new_v4();
        let token = create_jwt(user_id, Role::Admin, "test-secret");

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .expect("token should verify");
        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.role, Role::Admin);
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let token = create_jwt(Uuid::new_v4(), Role::User, "secret-a");
        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret-b"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn role_mismatch_is_forbidden() {
        let ctx = AuthContext {
            user_id: Uuid::new_v4(),
            role: Role::User,
        };
        assert!(authorize(&ctx, Role::User).is_ok());
        assert!(matches!(
            authorize(&ctx, Role::Admin),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn role_parses_from_storage_strings() {
        assert_eq!(Role::try_from("user".to_string()).expect("user"), Role::User);
        assert_eq!(
            Role::try_from("admin".to_string()).expect("admin"),
            Role::Admin
        );
        assert!(Role::try_from("root".to_string()).is_err());
    }
}
