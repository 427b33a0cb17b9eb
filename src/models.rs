//! Shared data models used across modules

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored playlist with its videos, as returned by `GET /playlists`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistWithVideos {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub is_public: bool,
    pub fetched_at: DateTime<Utc>,
    pub videos: Vec<Video>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub video_id: String,
    pub playlist_id: i64,
}

/// A video extracted from the catalog API, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideo {
    pub title: String,
    pub video_id: String,
}

/// One playlist snapshot ready for insertion, videos in source order.
#[derive(Debug)]
pub struct NewPlaylist {
    pub title: String,
    pub description: Option<String>,
    pub user_id: Option<i64>,
    pub is_public: bool,
    pub videos: Vec<NewVideo>,
}
