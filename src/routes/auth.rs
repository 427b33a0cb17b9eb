//! Sign-in, session, and logout endpoints

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;
use crate::domain::{accounts, oauth_states, users};
use crate::services::error::{ApiError, LogErr};
use crate::services::{auth, cookies, session};

pub fn routes() -> Router<Arc<AppState>> {
    // Rate limit auth endpoints to slow down brute force attempts
    let rate_limit_config = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("Failed to build rate limit config");

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config.into(),
    };

    Router::new()
        .route("/auth/google", get(auth_google))
        .route("/auth/google/token", post(auth_google_token))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(get_me))
        .layer(rate_limit_layer)
}

// ============================================================================
// Session extractor
// ============================================================================

/// Extractor resolving the caller's session, if any. An absent, expired, or
/// invalid cookie is not a rejection; handlers decide what anonymity means.
pub struct MaybeSession(pub Option<session::Session>);

impl FromRequestParts<Arc<AppState>> for MaybeSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                eprintln!("Cookie extraction error: {:?}", e);
                ApiError::internal("Internal server error")
            })?;

        let Some(cookie) = jar.get(cookies::config::SESSION_COOKIE_NAME) else {
            return Ok(MaybeSession(None));
        };

        let user_id = match session::validate_session_token(cookie.value(), &state.jwt_secret) {
            Ok(user_id) => user_id,
            Err(_) => return Ok(MaybeSession(None)),
        };

        let resolved = session::resolve_session(&state.db, &state.google, user_id)
            .await
            .log_500("Session resolution error")?;

        Ok(MaybeSession(resolved))
    }
}

// ============================================================================
// Sign-in endpoints
// ============================================================================

#[derive(Serialize)]
struct AuthUrlResponse {
    url: String,
}

/// GET /auth/google - Start the OAuth flow; returns the URL to send the user to
async fn auth_google(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AuthUrlResponse>, ApiError> {
    let request = state.google.get_authorize_url();

    oauth_states::save_state(&state.db, &request.state)
        .await
        .log_500("Save OAuth state error")?;

    Ok(Json(AuthUrlResponse { url: request.url }))
}

#[derive(Deserialize)]
struct TokenRequest {
    code: String,
    state: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    user_id: i64,
    name: Option<String>,
}

/// POST /auth/google/token - Exchange the OAuth code for a session cookie
async fn auth_google_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Response, ApiError> {
    let valid = oauth_states::take_state(&state.db, &req.state)
        .await
        .log_500("OAuth state lookup error")?;
    if !valid {
        return Err(ApiError::bad_request("Invalid or expired OAuth state"));
    }

    let token_response = state
        .google
        .exchange_code(&req.code)
        .await
        .log_as("Code exchange error", ApiError::internal("Failed to complete sign-in"))?;

    let profile = state
        .google
        .get_userinfo(&token_response.access_token)
        .await
        .log_as("Userinfo error", ApiError::internal("Failed to complete sign-in"))?;

    let expires_at = Utc::now()
        + Duration::seconds(
            token_response
                .expires_in
                .unwrap_or(auth::DEFAULT_TOKEN_LIFETIME_SECS),
        );

    // Identity and token record land together or not at all
    let mut tx = state.db.begin().await.log_500("Begin transaction error")?;
    let user_id = users::upsert_user(
        &mut *tx,
        &profile.sub,
        profile.name.as_deref(),
        profile.email.as_deref(),
        profile.picture.as_deref(),
    )
    .await
    .log_500("Upsert user error")?;
    accounts::upsert_account(
        &mut *tx,
        user_id,
        &token_response.access_token,
        token_response.refresh_token.as_deref(),
        expires_at,
    )
    .await
    .log_500("Upsert account error")?;
    tx.commit().await.log_500("Commit sign-in error")?;

    let session_token = session::create_session_token(user_id, &state.jwt_secret)
        .log_500("Create session token error")?;

    let mut response = Json(LoginResponse {
        user_id,
        name: profile.name,
    })
    .into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_session_cookie(&session_token)?);

    Ok(response)
}

/// POST /auth/logout - Clear the session cookie
async fn logout() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookies::build_clear_session_cookie());
    response
}

/// GET /auth/me - Current session identity, including any refresh error marker
async fn get_me(
    MaybeSession(session): MaybeSession,
) -> Result<Json<session::Session>, ApiError> {
    let session = session.ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Not signed in"))?;
    Ok(Json(session))
}
