//! User identity records, created on first sign-in

use sqlx::{Executor, Postgres};

#[derive(Debug, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

pub async fn get_user_by_id<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Option<UserRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as("SELECT id, name, email, image FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Create or update the user row for a Google subject. Identity fields are
/// refreshed on every sign-in.
pub async fn upsert_user<'e, E>(
    executor: E,
    google_id: &str,
    name: Option<&str>,
    email: Option<&str>,
    image: Option<&str>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO users (google_id, name, email, image)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (google_id) DO UPDATE SET
            name = $2,
            email = $3,
            image = $4,
            updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(google_id)
    .bind(name)
    .bind(email)
    .bind(image)
    .fetch_one(executor)
    .await?;

    Ok(row.0)
}
