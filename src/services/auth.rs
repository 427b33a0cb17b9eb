//! Token refresh against the OAuth provider.
//!
//! A refresh is a single best-effort attempt. Provider failures never cross
//! this boundary as errors; they are folded into the token record as the
//! `RefreshAccessTokenError` marker, which callers must inspect.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::domain::accounts::{self, AccountTokens};
use crate::services::google::{GoogleClient, GoogleError, TokenResponse};

/// Marker recorded on the token record when a refresh attempt fails
pub const REFRESH_ERROR_MARKER: &str = "RefreshAccessTokenError";

/// Access-token lifetime assumed when the provider omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Fold a refresh outcome into the stored token record.
///
/// Success replaces the access token and expiry, and the refresh token only
/// if the provider sent a new one. Failure leaves every token field
/// untouched and sets the error marker.
pub fn apply_refresh(
    tokens: AccountTokens,
    outcome: Result<TokenResponse, GoogleError>,
) -> AccountTokens {
    match outcome {
        Ok(response) => AccountTokens {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(tokens.refresh_token),
            expires_at: Utc::now()
                + Duration::seconds(response.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)),
            refresh_error: None,
        },
        Err(_) => AccountTokens {
            refresh_error: Some(REFRESH_ERROR_MARKER.to_string()),
            ..tokens
        },
    }
}

/// Run one refresh attempt for a user's token record and write the result
/// back to the accounts table. Only the write-back can fail here.
pub async fn refresh_access_token(
    db: &PgPool,
    google: &GoogleClient,
    user_id: i64,
    tokens: AccountTokens,
) -> Result<AccountTokens, sqlx::Error> {
    let outcome = match &tokens.refresh_token {
        Some(refresh_token) => google.refresh_token(refresh_token).await,
        None => Err(GoogleError::Api("no refresh token on record".to_string())),
    };

    if let Err(e) = &outcome {
        eprintln!("Token refresh error for user {}: {}", user_id, e);
    }

    let updated = apply_refresh(tokens, outcome);
    accounts::update_tokens(db, user_id, &updated).await?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_tokens() -> AccountTokens {
        AccountTokens {
            access_token: "old-access".to_string(),
            refresh_token: Some("old-refresh".to_string()),
            expires_at: Utc::now() - Duration::minutes(5),
            refresh_error: None,
        }
    }

    #[test]
    fn success_updates_access_token_and_keeps_old_refresh_token() {
        let updated = apply_refresh(
            stored_tokens(),
            Ok(TokenResponse {
                access_token: "new-access".to_string(),
                expires_in: Some(3599),
                refresh_token: None,
            }),
        );

        assert_eq!(updated.access_token, "new-access");
        assert_eq!(updated.refresh_token.as_deref(), Some("old-refresh"));
        assert!(updated.refresh_error.is_none());
        assert!(updated.expires_at > Utc::now() + Duration::seconds(3500));
    }

    #[test]
    fn success_takes_rotated_refresh_token() {
        let updated = apply_refresh(
            stored_tokens(),
            Ok(TokenResponse {
                access_token: "new-access".to_string(),
                expires_in: Some(3599),
                refresh_token: Some("new-refresh".to_string()),
            }),
        );

        assert_eq!(updated.refresh_token.as_deref(), Some("new-refresh"));
    }

    #[test]
    fn missing_expiry_falls_back_to_one_hour() {
        let updated = apply_refresh(
            stored_tokens(),
            Ok(TokenResponse {
                access_token: "new-access".to_string(),
                expires_in: None,
                refresh_token: None,
            }),
        );

        let lifetime = updated.expires_at - Utc::now();
        assert!(lifetime > Duration::seconds(3500));
        assert!(lifetime <= Duration::seconds(3600));
    }

    #[test]
    fn failure_sets_marker_and_leaves_tokens_untouched() {
        let before = stored_tokens();
        let expires_at = before.expires_at;

        let updated = apply_refresh(before, Err(GoogleError::Api("invalid_grant".to_string())));

        assert_eq!(updated.access_token, "old-access");
        assert_eq!(updated.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(updated.expires_at, expires_at);
        assert_eq!(updated.refresh_error.as_deref(), Some(REFRESH_ERROR_MARKER));
    }
}
