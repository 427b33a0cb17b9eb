//! Playlist ingestion and listing endpoints

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::MaybeSession;
use crate::AppState;
use crate::domain::playlists;
use crate::models::{NewPlaylist, PlaylistWithVideos};
use crate::services::error::{ApiError, LogErr};
use crate::services::session::Session;
use crate::services::youtube::{ApiAuth, PlaylistResource, YouTubeError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ingest", post(ingest))
        .route("/playlists", get(list_playlists))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestRequest {
    /// Defaulted so an absent channelId takes the empty-string 400 path
    /// instead of a deserialization rejection.
    #[serde(default)]
    channel_id: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct IngestResponse {
    message: String,
}

/// POST /ingest - Snapshot a channel's playlists and their videos into the
/// store.
///
/// Each call creates a fresh set of rows; nothing is deduplicated against
/// earlier snapshots. A signed-in caller's access token takes priority over
/// an API key in the body.
async fn ingest(
    State(state): State<Arc<AppState>>,
    MaybeSession(session): MaybeSession,
    Json(req): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    if req.channel_id.is_empty() {
        return Err(ApiError::bad_request("channelId is required"));
    }

    let access_token = session.as_ref().and_then(|s| s.access_token.clone());
    let auth = ApiAuth::from_credentials(access_token, req.api_key)
        .ok_or_else(|| ApiError::bad_request("No access token or API key provided"))?;

    let found = state
        .youtube
        .list_playlists(&req.channel_id, &auth)
        .await
        .log_as(
            "Playlist list error",
            ApiError::internal("Failed to fetch playlists or videos"),
        )?;

    if found.is_empty() {
        return Err(ApiError::not_found("No playlists found for this channel"));
    }

    let (user_id, is_public) = snapshot_ownership(session.as_ref());

    // One branch per playlist, run concurrently and joined all-or-nothing.
    // A failed branch fails the request; branches that already committed
    // stay committed (no cross-playlist transaction).
    let branches = found
        .into_iter()
        .map(|playlist| ingest_one(&state, &auth, user_id, is_public, playlist));
    try_join_all(branches).await.log_as(
        "Ingestion error",
        ApiError::internal("Failed to fetch playlists or videos"),
    )?;

    Ok(Json(IngestResponse {
        message: "Success! Playlists added successfully.".to_string(),
    }))
}

/// Ownership and visibility for a snapshot: owned and private when the
/// caller is signed in, unowned and public otherwise.
fn snapshot_ownership(session: Option<&Session>) -> (Option<i64>, bool) {
    let user_id = session.map(|s| s.user.id);
    (user_id, user_id.is_none())
}

/// Fetch one playlist's items and persist playlist plus videos as one unit
async fn ingest_one(
    state: &AppState,
    auth: &ApiAuth,
    user_id: Option<i64>,
    is_public: bool,
    playlist: PlaylistResource,
) -> Result<i64, IngestBranchError> {
    let items = state
        .youtube
        .list_playlist_items(&playlist.id, auth)
        .await?;
    let videos = items.iter().map(|item| item.to_video()).collect();

    let new_playlist = NewPlaylist {
        title: playlist.title(),
        description: playlist.description(),
        user_id,
        is_public,
        videos,
    };

    let id = playlists::insert_playlist_with_videos(&state.db, &new_playlist).await?;
    Ok(id)
}

#[derive(Debug)]
enum IngestBranchError {
    Upstream(YouTubeError),
    Persistence(sqlx::Error),
}

impl From<YouTubeError> for IngestBranchError {
    fn from(e: YouTubeError) -> Self {
        IngestBranchError::Upstream(e)
    }
}

impl From<sqlx::Error> for IngestBranchError {
    fn from(e: sqlx::Error) -> Self {
        IngestBranchError::Persistence(e)
    }
}

impl std::fmt::Display for IngestBranchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestBranchError::Upstream(e) => write!(f, "upstream fetch failed: {}", e),
            IngestBranchError::Persistence(e) => write!(f, "persistence failed: {}", e),
        }
    }
}

/// GET /playlists - The caller's own playlists, or public ones when anonymous
async fn list_playlists(
    State(state): State<Arc<AppState>>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<Vec<PlaylistWithVideos>>, ApiError> {
    let result = match &session {
        Some(s) => playlists::list_for_user(&state.db, s.user.id).await,
        None => playlists::list_public(&state.db).await,
    };

    let rows = result.log_as(
        "Playlist query error",
        ApiError::internal("Failed to fetch playlists"),
    )?;

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::session::SessionUser;

    fn signed_in(user_id: i64) -> Session {
        Session {
            user: SessionUser {
                id: user_id,
                name: None,
                email: None,
                image: None,
            },
            access_token: Some("ya29.tok".to_string()),
            error: None,
        }
    }

    #[test]
    fn ingest_request_uses_camel_case_keys() {
        let req: IngestRequest =
            serde_json::from_str(r#"{"channelId": "UCabc", "apiKey": "KEY1"}"#).unwrap();
        assert_eq!(req.channel_id, "UCabc");
        assert_eq!(req.api_key.as_deref(), Some("KEY1"));

        let bare: IngestRequest = serde_json::from_str(r#"{"channelId": "UCabc"}"#).unwrap();
        assert!(bare.api_key.is_none());
    }

    #[test]
    fn missing_channel_id_deserializes_to_empty_string() {
        // An absent channelId must reach the handler's 400 check rather
        // than fail body deserialization
        let req: IngestRequest = serde_json::from_str(r#"{"apiKey": "KEY1"}"#).unwrap();
        assert_eq!(req.channel_id, "");
    }

    #[test]
    fn signed_in_snapshots_are_owned_and_private() {
        let session = signed_in(7);
        let (user_id, is_public) = snapshot_ownership(Some(&session));
        assert_eq!(user_id, Some(7));
        assert!(!is_public);
    }

    #[test]
    fn anonymous_snapshots_are_unowned_and_public() {
        let (user_id, is_public) = snapshot_ownership(None);
        assert_eq!(user_id, None);
        assert!(is_public);
    }
}
