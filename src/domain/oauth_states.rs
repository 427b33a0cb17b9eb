//! Single-use OAuth state tokens for the sign-in flow

use sqlx::PgPool;

pub async fn save_state(db: &PgPool, state: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO oauth_states (state) VALUES ($1)")
        .bind(state)
        .execute(db)
        .await?;
    Ok(())
}

/// Consume a state token. Atomic DELETE + RETURNING keeps each state
/// single-use even when two callbacks race; states older than ten minutes
/// no longer match.
pub async fn take_state(db: &PgPool, state: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        DELETE FROM oauth_states
        WHERE state = $1 AND created_at > NOW() - INTERVAL '10 minutes'
        RETURNING state
        "#,
    )
    .bind(state)
    .fetch_optional(db)
    .await?;

    Ok(row.is_some())
}
