//! Cookie building utilities for the session cookie
//!
//! Centralizes cookie formatting so sign-in and logout stay consistent.

use axum::http::HeaderValue;

use super::error::ApiError;

/// Cookie configuration constants
pub mod config {
    /// Session cookie name
    pub const SESSION_COOKIE_NAME: &str = "session_token";
    /// Session max-age in seconds (24 hours, matching the JWT lifetime)
    pub const SESSION_MAX_AGE_SECS: u32 = 24 * 60 * 60;
    /// Path for the session cookie (all routes)
    pub const SESSION_COOKIE_PATH: &str = "/";
}

fn is_dev() -> bool {
    std::env::var("ENV").as_deref() != Ok("prod")
}

fn cookie_same_site() -> &'static str {
    match std::env::var("COOKIE_SAMESITE")
        .unwrap_or_else(|_| "Lax".to_string())
        .to_lowercase()
        .as_str()
    {
        "none" => "None",
        "strict" => "Strict",
        "lax" => "Lax",
        _ => "Lax",
    }
}

/// Build the session Set-Cookie header value
pub fn build_session_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    let same_site = cookie_same_site();
    let secure = if is_dev() { "" } else { " Secure;" };
    let cookie = format!(
        "{}={}; HttpOnly;{} SameSite={}; Path={}; Max-Age={}",
        config::SESSION_COOKIE_NAME,
        token,
        secure,
        same_site,
        config::SESSION_COOKIE_PATH,
        config::SESSION_MAX_AGE_SECS
    );
    cookie.parse().map_err(|_| {
        eprintln!("Failed to parse session cookie header");
        ApiError::internal("Internal server error")
    })
}

/// Build a Set-Cookie header that clears the session cookie
pub fn build_clear_session_cookie() -> HeaderValue {
    format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path={}; Max-Age=0",
        config::SESSION_COOKIE_NAME,
        config::SESSION_COOKIE_PATH
    )
    .parse()
    .expect("static cookie string should always parse")
}
