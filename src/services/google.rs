//! Google OAuth 2.0 client: authorization URL, code exchange, token refresh,
//! and OIDC userinfo.

use base64::Engine;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Scopes requested at sign-in. `youtube.readonly` lets the backend call the
/// Data API with the user's access token.
pub const SCOPES: &[&str] = &[
    "openid",
    "profile",
    "email",
    "https://www.googleapis.com/auth/youtube.readonly",
];

#[derive(Clone)]
pub struct GoogleClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: Client,
}

impl GoogleClient {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            http: Client::new(),
        }
    }

    /// Generate random state for CSRF protection
    fn generate_state() -> String {
        let bytes: [u8; 16] = rand::rng().random();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Step 1: Build the authorization URL and the state to store.
    ///
    /// `access_type=offline` with `prompt=consent` makes Google return a
    /// refresh token on sign-in.
    pub fn get_authorize_url(&self) -> AuthorizeRequest {
        let state = Self::generate_state();
        let scope = SCOPES.join(" ");

        let url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline&prompt=consent",
            AUTH_URL,
            percent_encode(&self.client_id),
            percent_encode(&self.redirect_uri),
            percent_encode(&scope),
            percent_encode(&state)
        );

        AuthorizeRequest { url, state }
    }

    /// Step 2: Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GoogleError> {
        let params = [
            ("code", code),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("grant_type", "authorization_code"),
            ("redirect_uri", &self.redirect_uri),
        ];

        let resp = self
            .http
            .post(TOKEN_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(GoogleError::Api(text));
        }

        let token: TokenResponse = resp.json().await?;
        Ok(token)
    }

    /// Exchange a refresh token for a new access token. One attempt, no
    /// retries; the caller decides what a failure means.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, GoogleError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let resp = self
            .http
            .post(TOKEN_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(&params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(GoogleError::Api(text));
        }

        let token: TokenResponse = resp.json().await?;
        Ok(token)
    }

    /// Fetch the signed-in user's OIDC profile
    pub async fn get_userinfo(&self, access_token: &str) -> Result<GoogleUser, GoogleError> {
        let resp = self
            .http
            .get(USERINFO_URL)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(GoogleError::Api(text));
        }

        let user: GoogleUser = resp.json().await?;
        Ok(user)
    }
}

fn percent_encode(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[derive(Debug)]
pub struct AuthorizeRequest {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds; absent in some provider responses.
    pub expires_in: Option<i64>,
    /// Only present on first consent or when Google rotates it.
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleUser {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug)]
pub enum GoogleError {
    Http(reqwest::Error),
    Api(String),
}

impl From<reqwest::Error> for GoogleError {
    fn from(e: reqwest::Error) -> Self {
        GoogleError::Http(e)
    }
}

impl std::fmt::Display for GoogleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoogleError::Http(e) => write!(f, "HTTP error: {}", e),
            GoogleError::Api(s) => write!(f, "Google API error: {}", s),
        }
    }
}

impl std::error::Error for GoogleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_state_and_offline_access() {
        let client = GoogleClient::new("client-id", "secret", "http://localhost/cb");
        let request = client.get_authorize_url();

        assert!(request.url.starts_with(AUTH_URL));
        assert!(request.url.contains("access_type=offline"));
        assert!(request.url.contains("prompt=consent"));
        assert!(request.url.contains(&percent_encode(&request.state)));
        assert!(request.url.contains("youtube"));
    }

    #[test]
    fn states_are_unique_per_request() {
        let client = GoogleClient::new("client-id", "secret", "http://localhost/cb");
        assert_ne!(
            client.get_authorize_url().state,
            client.get_authorize_url().state
        );
    }

    #[test]
    fn token_response_without_refresh_token_parses() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.abc","expires_in":3599,"token_type":"Bearer","scope":"openid"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "ya29.abc");
        assert_eq!(token.expires_in, Some(3599));
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn token_response_with_rotated_refresh_token_parses() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.abc","expires_in":3599,"refresh_token":"1//new"}"#,
        )
        .unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("1//new"));
    }
}
