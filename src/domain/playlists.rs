//! Playlist snapshot inserts and listing queries

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::models::{NewPlaylist, PlaylistWithVideos, Video};

#[derive(Debug, sqlx::FromRow)]
struct PlaylistRow {
    id: i64,
    title: String,
    description: Option<String>,
    user_id: Option<i64>,
    is_public: bool,
    fetched_at: DateTime<Utc>,
}

/// Insert one playlist and its full video batch as a single unit. The
/// transaction spans this playlist only; sibling playlists of the same
/// ingestion commit independently.
pub async fn insert_playlist_with_videos(
    db: &PgPool,
    playlist: &NewPlaylist,
) -> Result<i64, sqlx::Error> {
    let mut tx = db.begin().await?;

    let row: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO playlists (title, description, user_id, is_public, fetched_at)
        VALUES ($1, $2, $3, $4, NOW())
        RETURNING id
        "#,
    )
    .bind(&playlist.title)
    .bind(&playlist.description)
    .bind(playlist.user_id)
    .bind(playlist.is_public)
    .fetch_one(&mut *tx)
    .await?;
    let playlist_id = row.0;

    // Insert in source order so ids reflect the catalog's ordering
    for video in &playlist.videos {
        sqlx::query("INSERT INTO videos (title, video_id, playlist_id) VALUES ($1, $2, $3)")
            .bind(&video.title)
            .bind(&video.video_id)
            .bind(playlist_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(playlist_id)
}

/// Playlists owned by a user, most recently ingested first, videos nested
pub async fn list_for_user(
    db: &PgPool,
    user_id: i64,
) -> Result<Vec<PlaylistWithVideos>, sqlx::Error> {
    let rows: Vec<PlaylistRow> = sqlx::query_as(
        r#"
        SELECT id, title, description, user_id, is_public, fetched_at
        FROM playlists
        WHERE user_id = $1
        ORDER BY fetched_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    attach_videos(db, rows).await
}

/// Public (anonymously ingested) playlists, most recently ingested first
pub async fn list_public(db: &PgPool) -> Result<Vec<PlaylistWithVideos>, sqlx::Error> {
    let rows: Vec<PlaylistRow> = sqlx::query_as(
        r#"
        SELECT id, title, description, user_id, is_public, fetched_at
        FROM playlists
        WHERE is_public = TRUE
        ORDER BY fetched_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;

    attach_videos(db, rows).await
}

/// One query for every video on the page, grouped back onto its playlist
async fn attach_videos(
    db: &PgPool,
    rows: Vec<PlaylistRow>,
) -> Result<Vec<PlaylistWithVideos>, sqlx::Error> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let videos: Vec<Video> = sqlx::query_as(
        r#"
        SELECT id, title, video_id, playlist_id
        FROM videos
        WHERE playlist_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut by_playlist: HashMap<i64, Vec<Video>> = HashMap::new();
    for video in videos {
        by_playlist.entry(video.playlist_id).or_default().push(video);
    }

    Ok(rows
        .into_iter()
        .map(|r| PlaylistWithVideos {
            videos: by_playlist.remove(&r.id).unwrap_or_default(),
            id: r.id,
            title: r.title,
            description: r.description,
            user_id: r.user_id,
            is_public: r.is_public,
            fetched_at: r.fetched_at,
        })
        .collect())
}
