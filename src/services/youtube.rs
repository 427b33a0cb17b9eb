//! YouTube Data API v3 client for playlists and playlist items.

use reqwest::Client;
use serde::Deserialize;

use crate::models::NewVideo;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// First page only. Channels with more playlists, or playlists with more
/// videos, than this are truncated.
const PAGE_SIZE: &str = "50";

const PARTS: &str = "snippet,contentDetails";

/// Credential presented to the Data API: a user's OAuth bearer token, or a
/// raw API key sent as a query parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuth {
    Bearer(String),
    Key(String),
}

impl ApiAuth {
    /// Pick the auth means for a request: the bearer token wins when both
    /// are present; neither means the request cannot be made.
    pub fn from_credentials(access_token: Option<String>, api_key: Option<String>) -> Option<Self> {
        match (access_token, api_key) {
            (Some(token), _) => Some(ApiAuth::Bearer(token)),
            (None, Some(key)) => Some(ApiAuth::Key(key)),
            (None, None) => None,
        }
    }
}

#[derive(Clone)]
pub struct YouTubeClient {
    http: Client,
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YouTubeClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    fn get(&self, url: &str, auth: &ApiAuth) -> reqwest::RequestBuilder {
        let req = self.http.get(url);
        match auth {
            ApiAuth::Bearer(token) => req.header("Authorization", format!("Bearer {}", token)),
            ApiAuth::Key(key) => req.query(&[("key", key.as_str())]),
        }
    }

    /// List up to 50 playlists owned by a channel (first page only)
    pub async fn list_playlists(
        &self,
        channel_id: &str,
        auth: &ApiAuth,
    ) -> Result<Vec<PlaylistResource>, YouTubeError> {
        let url = format!("{}/playlists", API_BASE);

        let resp = self
            .get(&url, auth)
            .query(&[
                ("channelId", channel_id),
                ("part", PARTS),
                ("maxResults", PAGE_SIZE),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(YouTubeError::Api(text));
        }

        let wrapper: ListResponse<PlaylistResource> = resp.json().await?;
        Ok(wrapper.items)
    }

    /// List up to 50 items of a playlist (first page only)
    pub async fn list_playlist_items(
        &self,
        playlist_id: &str,
        auth: &ApiAuth,
    ) -> Result<Vec<PlaylistItemResource>, YouTubeError> {
        let url = format!("{}/playlistItems", API_BASE);

        let resp = self
            .get(&url, auth)
            .query(&[
                ("playlistId", playlist_id),
                ("part", PARTS),
                ("maxResults", PAGE_SIZE),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(YouTubeError::Api(text));
        }

        let wrapper: ListResponse<PlaylistItemResource> = resp.json().await?;
        Ok(wrapper.items)
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ListResponse<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistResource {
    pub id: String,
    pub snippet: Option<PlaylistSnippet>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistSnippet {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PlaylistResource {
    pub fn title(&self) -> String {
        self.snippet
            .as_ref()
            .and_then(|s| s.title.clone())
            .unwrap_or_else(|| "Untitled Playlist".to_string())
    }

    pub fn description(&self) -> Option<String> {
        self.snippet.as_ref().and_then(|s| s.description.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemResource {
    pub snippet: Option<ItemSnippet>,
    pub content_details: Option<ItemContentDetails>,
}

#[derive(Debug, Deserialize)]
pub struct ItemSnippet {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemContentDetails {
    pub video_id: Option<String>,
}

impl PlaylistItemResource {
    /// Title and external video id with the documented fallbacks for items
    /// the API returns without a snippet (deleted or private videos).
    pub fn to_video(&self) -> NewVideo {
        NewVideo {
            title: self
                .snippet
                .as_ref()
                .and_then(|s| s.title.clone())
                .unwrap_or_else(|| "Untitled Video".to_string()),
            video_id: self
                .content_details
                .as_ref()
                .and_then(|c| c.video_id.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug)]
pub enum YouTubeError {
    Http(reqwest::Error),
    Api(String),
}

impl From<reqwest::Error> for YouTubeError {
    fn from(e: reqwest::Error) -> Self {
        YouTubeError::Http(e)
    }
}

impl std::fmt::Display for YouTubeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YouTubeError::Http(e) => write!(f, "HTTP error: {}", e),
            YouTubeError::Api(s) => write!(f, "YouTube API error: {}", s),
        }
    }
}

impl std::error::Error for YouTubeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_wins_over_api_key() {
        let auth = ApiAuth::from_credentials(Some("tok".to_string()), Some("key".to_string()));
        assert_eq!(auth, Some(ApiAuth::Bearer("tok".to_string())));
    }

    #[test]
    fn api_key_used_when_no_token() {
        let auth = ApiAuth::from_credentials(None, Some("key".to_string()));
        assert_eq!(auth, Some(ApiAuth::Key("key".to_string())));
    }

    #[test]
    fn no_credentials_means_no_auth() {
        assert_eq!(ApiAuth::from_credentials(None, None), None);
    }

    #[test]
    fn default_builds_a_client() {
        let _ = YouTubeClient::default();
    }

    #[test]
    fn playlist_list_response_parses() {
        let body = r#"{
            "kind": "youtube#playlistListResponse",
            "items": [
                {"id": "PL1", "snippet": {"title": "Mix", "description": "d"}},
                {"id": "PL2"}
            ]
        }"#;
        let parsed: ListResponse<PlaylistResource> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].title(), "Mix");
        assert_eq!(parsed.items[0].description().as_deref(), Some("d"));
        assert_eq!(parsed.items[1].title(), "Untitled Playlist");
        assert!(parsed.items[1].description().is_none());
    }

    #[test]
    fn empty_and_missing_items_parse_as_no_playlists() {
        let empty: ListResponse<PlaylistResource> =
            serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(empty.items.is_empty());

        let missing: ListResponse<PlaylistResource> = serde_json::from_str(r#"{}"#).unwrap();
        assert!(missing.items.is_empty());
    }

    #[test]
    fn playlist_item_maps_to_video_with_fallbacks() {
        let body = r#"{
            "items": [
                {"snippet": {"title": "First"}, "contentDetails": {"videoId": "abc123"}},
                {"contentDetails": {}},
                {}
            ]
        }"#;
        let parsed: ListResponse<PlaylistItemResource> = serde_json::from_str(body).unwrap();
        let videos: Vec<_> = parsed.items.iter().map(|i| i.to_video()).collect();

        assert_eq!(videos[0].title, "First");
        assert_eq!(videos[0].video_id, "abc123");
        assert_eq!(videos[1].title, "Untitled Video");
        assert_eq!(videos[1].video_id, "");
        assert_eq!(videos[2].title, "Untitled Video");
        assert_eq!(videos[2].video_id, "");
    }
}
