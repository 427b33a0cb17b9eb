//! Session management: JWT session cookies and per-request resolution.
//!
//! The cookie is a signed JWT carrying only the user id; OAuth token material
//! stays in the accounts table. Resolving a session loads the identity and
//! token record, refreshing the access token once if it has expired.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::{accounts, users};
use crate::services::auth;
use crate::services::google::GoogleClient;

/// JWT claims for the session cookie
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id as string
    pub exp: i64,    // expiry timestamp
    pub iat: i64,    // issued at
}

#[derive(Debug)]
pub enum SessionError {
    InvalidToken,
    Expired,
    DatabaseError(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::InvalidToken => write!(f, "Invalid token"),
            SessionError::Expired => write!(f, "Token expired"),
            SessionError::DatabaseError(e) => write!(f, "Database error: {}", e),
        }
    }
}

const SESSION_EXPIRY_HOURS: i64 = 24;

/// Create a session JWT valid for 24 hours
pub fn create_session_token(user_id: i64, secret: &[u8]) -> Result<String, SessionError> {
    let now = Utc::now();
    let exp = now + Duration::hours(SESSION_EXPIRY_HOURS);

    let claims = Claims {
        sub: user_id.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|_| SessionError::InvalidToken)
}

/// Validate a session JWT and return the user_id
pub fn validate_session_token(token: &str, secret: &[u8]) -> Result<i64, SessionError> {
    // HS256 only to prevent algorithm confusion attacks
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub", "iat"]);

    let token_data =
        decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::InvalidToken,
            }
        })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| SessionError::InvalidToken)
}

/// What a resolved session exposes to handlers and to `GET /auth/me`.
/// The refresh token never leaves the accounts table.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: SessionUser,
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// Resolve a session from an already-validated user id.
///
/// If the stored access token has expired, one refresh attempt is made and
/// its outcome (marker included) is propagated into the session. A token
/// record already carrying a refresh error is left alone; the caller must
/// sign in again to recover.
pub async fn resolve_session(
    db: &PgPool,
    google: &GoogleClient,
    user_id: i64,
) -> Result<Option<Session>, SessionError> {
    let user = users::get_user_by_id(db, user_id)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;
    let Some(user) = user else {
        // Valid JWT for a deleted user; treat as signed out
        return Ok(None);
    };

    let account = accounts::get_tokens(db, user_id)
        .await
        .map_err(|e| SessionError::DatabaseError(e.to_string()))?;

    let (access_token, error) = match account {
        None => (None, None),
        Some(tokens) => {
            if tokens.refresh_error.is_some() {
                (Some(tokens.access_token), tokens.refresh_error)
            } else if Utc::now() < tokens.expires_at {
                (Some(tokens.access_token), None)
            } else {
                let refreshed = auth::refresh_access_token(db, google, user_id, tokens)
                    .await
                    .map_err(|e| SessionError::DatabaseError(e.to_string()))?;
                (Some(refreshed.access_token), refreshed.refresh_error)
            }
        }
    };

    Ok(Some(Session {
        user: SessionUser {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
        },
        access_token,
        error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn session_token_round_trips() {
        let token = create_session_token(42, SECRET).unwrap();
        assert_eq!(validate_session_token(&token, SECRET).unwrap(), 42);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_session_token(42, SECRET).unwrap();
        assert!(matches!(
            validate_session_token(&token, b"other-secret"),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Build a token that expired beyond the default validation leeway
        let now = Utc::now();
        let claims = Claims {
            sub: "42".to_string(),
            exp: (now - Duration::minutes(10)).timestamp(),
            iat: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(
            validate_session_token(&token, SECRET),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            validate_session_token("not-a-jwt", SECRET),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn session_serialization_never_includes_a_refresh_token() {
        let session = Session {
            user: SessionUser {
                id: 1,
                name: Some("Ada".to_string()),
                email: None,
                image: None,
            },
            access_token: Some("ya29.tok".to_string()),
            error: None,
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("accessToken"));
        assert!(!json.to_lowercase().contains("refresh"));
    }
}
