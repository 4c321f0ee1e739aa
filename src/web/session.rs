use crate::db;
use crate::domain::models::UserRole;
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SESSION_TTL_HOURS: i64 = 24;

/// The per-request authorization context. Everything protected routes need is
/// carried here; handlers never re-derive identity from the request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    pub display_name: String,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(user_id: i64, username: String, role: UserRole, display_name: String) -> Self {
        Self {
            user_id,
            username,
            role,
            display_name,
            exp: (Utc::now() + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid token format")]
    Invalid,
    #[error("signature mismatch")]
    Signature,
    #[error("expired")]
    Expired,
}

pub fn sign_session(claims: &SessionClaims, key: &[u8]) -> Result<String, SessionError> {
    let payload = serde_json::to_vec(claims).map_err(|_| SessionError::Invalid)?;
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload);
    let sig = mac.finalize().into_bytes();
    Ok(format!(
        "{}.{}",
        general_purpose::STANDARD.encode(&payload),
        general_purpose::STANDARD.encode(sig)
    ))
}

pub fn verify_session(token: &str, key: &[u8]) -> Result<SessionClaims, SessionError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(SessionError::Invalid);
    }
    let payload_bytes = general_purpose::STANDARD
        .decode(parts[0])
        .map_err(|_| SessionError::Invalid)?;
    let sig_bytes = general_purpose::STANDARD
        .decode(parts[1])
        .map_err(|_| SessionError::Invalid)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SessionError::Invalid)?;
    mac.update(&payload_bytes);
    mac.verify_slice(&sig_bytes)
        .map_err(|_| SessionError::Signature)?;

    let claims: SessionClaims =
        serde_json::from_slice(&payload_bytes).map_err(|_| SessionError::Invalid)?;
    if Utc::now().timestamp() > claims.exp {
        return Err(SessionError::Expired);
    }
    Ok(claims)
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(val) = auth.to_str() {
            if let Some(bearer) = val.strip_prefix("Bearer ") {
                return Some(bearer.trim().to_string());
            }
        }
    }
    if let Some(cookie) = headers.get(axum::http::header::COOKIE) {
        if let Ok(val) = cookie.to_str() {
            for pair in val.split(';') {
                let trimmed = pair.trim();
                if let Some(rest) = trimmed.strip_prefix("session=") {
                    return Some(rest.to_string());
                }
            }
        }
    }
    None
}

/// Axum extractor validating the session and re-checking the user row, so a
/// deleted user's token stops working immediately.
pub struct UserSession(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
    SharedState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let shared = SharedState::from_ref(state);

        let token = extract_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = verify_session(&token, &shared.session_key).map_err(|e| {
            tracing::warn!("Session verification failed: {e}");
            AppError::Unauthorized
        })?;

        db::find_user_by_id(&shared.pool, claims.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(UserSession(claims))
    }
}

pub fn require_admin(claims: &SessionClaims) -> Result<(), AppError> {
    match claims.role {
        UserRole::Admin => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

pub fn require_employee(claims: &SessionClaims) -> Result<(), AppError> {
    match claims.role {
        UserRole::Employee => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> SessionClaims {
        SessionClaims::new(7, "ivanov".into(), UserRole::Employee, "Ivan Ivanov".into())
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let key = b"test-session-key";
        let token = sign_session(&claims(), key).unwrap();
        let verified = verify_session(&token, key).unwrap();
        assert_eq!(verified.user_id, 7);
        assert_eq!(verified.username, "ivanov");
        assert_eq!(verified.role, UserRole::Employee);
        assert_eq!(verified.display_name, "Ivan Ivanov");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let key = b"test-session-key";
        let token = sign_session(&claims(), key).unwrap();
        let mut forged = claims();
        forged.role = UserRole::Admin;
        let forged_payload =
            general_purpose::STANDARD.encode(serde_json::to_vec(&forged).unwrap());
        let sig = token.split('.').nth(1).unwrap();
        let spliced = format!("{forged_payload}.{sig}");
        assert!(matches!(
            verify_session(&spliced, key),
            Err(SessionError::Signature)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = sign_session(&claims(), b"key-one").unwrap();
        assert!(verify_session(&token, b"key-two").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let key = b"test-session-key";
        let mut expired = claims();
        expired.exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = sign_session(&expired, key).unwrap();
        assert!(matches!(
            verify_session(&token, key),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn extract_token_prefers_bearer_then_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "theme=dark; session=abc.def".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer xyz.123".parse().unwrap(),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz.123"));
    }
}
