//! Per-user OAuth token records. One row per user for the Google provider;
//! only sign-in and the token refresher write here.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Set when the last refresh attempt failed; cleared on sign-in.
    pub refresh_error: Option<String>,
}

pub async fn get_tokens<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Option<AccountTokens>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        r#"
        SELECT access_token, refresh_token, expires_at, refresh_error
        FROM accounts WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Insert or replace the token record at sign-in. A sign-in without a new
/// refresh token keeps whatever is already on record; the error marker is
/// always cleared, since the caller just re-authenticated.
pub async fn upsert_account<'e, E>(
    executor: E,
    user_id: i64,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO accounts (user_id, access_token, refresh_token, expires_at, refresh_error)
        VALUES ($1, $2, $3, $4, NULL)
        ON CONFLICT (user_id) DO UPDATE SET
            access_token = $2,
            refresh_token = COALESCE($3, accounts.refresh_token),
            expires_at = $4,
            refresh_error = NULL,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Write back a token record after a refresh attempt. The record already
/// carries the preserved refresh token (or the rotated one), so fields are
/// set verbatim.
pub async fn update_tokens<'e, E>(
    executor: E,
    user_id: i64,
    tokens: &AccountTokens,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        UPDATE accounts SET
            access_token = $2,
            refresh_token = $3,
            expires_at = $4,
            refresh_error = $5,
            updated_at = NOW()
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .bind(&tokens.access_token)
    .bind(&tokens.refresh_token)
    .bind(tokens.expires_at)
    .bind(&tokens.refresh_error)
    .execute(executor)
    .await?;

    Ok(())
}
