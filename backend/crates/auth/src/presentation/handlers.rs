//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use platform::cookie::extract_cookie;

use crate::application::config::{AuthConfig, OAUTH_STATE_COOKIE_NAME, REFRESH_COOKIE_NAME};
use crate::application::{CallbackInput, SignInInput, SignUpInput, TokenPair};
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    LoginRequest, MessageResponse, OAuthCallbackQuery, RegisterRequest, TokenResponse,
    UserResponse, VerifyQuery,
};
use crate::presentation::middleware::CurrentUser;
use crate::presentation::state::{AuthAppState, AuthBackend};

pub const REGISTERED_MESSAGE: &str =
    "User registered successfully. Please check your email to verify your account.";
pub const VERIFIED_MESSAGE: &str = "Email verified successfully";

// ============================================================================
// Register / Verify
// ============================================================================

/// POST /api/auth/register
pub async fn register<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let Json(req) = payload.map_err(body_rejected)?;

    let output = state
        .sign_up()
        .execute(SignUpInput {
            login: req.login,
            email: req.email,
            password: req.password,
            full_name: req.full_name,
        })
        .await?;

    tracing::debug!(user_id = %output.user_id, "Registration accepted");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(REGISTERED_MESSAGE)),
    ))
}

/// GET /api/auth/verify?token=...
pub async fn verify<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    Query(query): Query<VerifyQuery>,
) -> AuthResult<Json<MessageResponse>> {
    let token = query
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidInput("Token parameter is required".to_string()))?;

    state.verify_email().execute(&token).await?;

    Ok(Json(MessageResponse::new(VERIFIED_MESSAGE)))
}

// ============================================================================
// Login / Logout / Refresh
// ============================================================================

/// POST /api/auth/login
pub async fn login<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AuthResult<Response> {
    let Json(req) = payload.map_err(body_rejected)?;

    let pair = state
        .sign_in()
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(token_response(&state.config, &pair))
}

/// POST /api/auth/logout
///
/// An expired but genuine token signs out. A rejected one gets 401 and its
/// cookie cleared.
pub async fn logout<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = extract_cookie(&headers, REFRESH_COOKIE_NAME) else {
        return AuthError::MissingRefreshCookie.into_response();
    };

    let cookie = state.config.refresh_cookie().build_delete_cookie();
    match state.sign_out().execute(&token).await {
        Ok(()) => (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response(),
        Err(err) if err.status_code() == StatusCode::UNAUTHORIZED => {
            ([(header::SET_COOKIE, cookie)], err).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// POST /api/auth/refresh
///
/// Any 401 also clears the cookie so the client stops replaying it.
pub async fn refresh<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    headers: HeaderMap,
) -> Response {
    let result = match extract_cookie(&headers, REFRESH_COOKIE_NAME) {
        Some(token) => state.sessions.refresh(&token).await,
        None => Err(AuthError::SessionRevoked),
    };

    match result {
        Ok(pair) => token_response(&state.config, &pair),
        Err(err) if err.status_code() == StatusCode::UNAUTHORIZED => {
            let cookie = state.config.refresh_cookie().build_delete_cookie();
            ([(header::SET_COOKIE, cookie)], err).into_response()
        }
        Err(err) => err.into_response(),
    }
}

// ============================================================================
// Google OAuth2
// ============================================================================

/// GET /api/auth/google
pub async fn google<B: AuthBackend>(State(state): State<AuthAppState<B>>) -> impl IntoResponse {
    let request = state.oauth().begin();
    let cookie = state
        .config
        .oauth_state_cookie()
        .build_set_cookie(&request.state);

    (
        [(header::SET_COOKIE, cookie)],
        Redirect::temporary(&request.url),
    )
}

/// GET /api/auth/google/callback?state=...&code=...
///
/// The state cookie is single-use: every outcome clears it.
pub async fn google_callback<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    headers: HeaderMap,
    Query(query): Query<OAuthCallbackQuery>,
) -> Response {
    let clear_state = state.config.oauth_state_cookie().build_delete_cookie();

    let input = CallbackInput {
        query_state: query.state,
        code: query.code,
        cookie_state: extract_cookie(&headers, OAUTH_STATE_COOKIE_NAME),
    };

    match state.oauth().complete(input).await {
        Ok(signed_in) => {
            let refresh_cookie = state
                .config
                .refresh_cookie()
                .build_set_cookie(&signed_in.tokens.refresh_token);
            (
                StatusCode::OK,
                AppendHeaders([
                    (header::SET_COOKIE, clear_state),
                    (header::SET_COOKIE, refresh_cookie),
                ]),
                Json(TokenResponse::from(&signed_in.tokens)),
            )
                .into_response()
        }
        Err(err) => (AppendHeaders([(header::SET_COOKIE, clear_state)]), err).into_response(),
    }
}

// ============================================================================
// Users (requires authentication)
// ============================================================================

/// GET /api/users/me
pub async fn me<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    CurrentUser(claims): CurrentUser,
) -> AuthResult<Json<UserResponse>> {
    let user = state.accounts().profile(claims.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /api/users/{id} (admin)
pub async fn delete_user<B: AuthBackend>(
    State(state): State<AuthAppState<B>>,
    CurrentUser(claims): CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> AuthResult<StatusCode> {
    let Path(id) = id.map_err(|_| AuthError::InvalidInput("Invalid user id".to_string()))?;

    state
        .accounts()
        .delete(UserId::from_i64(id), claims.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Helper Functions
// ============================================================================

fn token_response(config: &AuthConfig, pair: &TokenPair) -> Response {
    let cookie = config.refresh_cookie().build_set_cookie(&pair.refresh_token);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse::from(pair)),
    )
        .into_response()
}

fn body_rejected(rejection: JsonRejection) -> AuthError {
    tracing::debug!(reason = %rejection.body_text(), "Request body rejected");
    AuthError::InvalidInput("Invalid request body".to_string())
}
