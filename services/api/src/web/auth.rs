//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: signup, login, logout and the password-reset flow.
//!
//! Where the flow sends the browser elsewhere, the outcome travels as an
//! `error=` or `success=` query code on the redirect target.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store_locator_core::ports::{Mail, PortError};
use store_locator_core::validation::{normalize_email, validate_signup, MIN_PASSWORD_LEN};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::middleware::{session_id, SESSION_COOKIE};
use crate::web::state::AppState;

const SESSION_DAYS: i64 = 30;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ForgotRequest {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetRequest {
    pub password: String,
    #[serde(alias = "password-confirm")]
    pub password_confirm: String,
}

#[derive(Serialize, ToSchema)]
pub struct ResetPageResponse {
    pub title: String,
    pub token: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 20 random bytes, hex encoded.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Creates an auth session for `user_id` and returns the `Set-Cookie` value.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_DAYS);

    state
        .db
        .create_auth_session(&auth_session_id, user_id, expires_at)
        .await?;

    Ok(format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        Duration::days(SESSION_DAYS).num_seconds()
    ))
}

fn cleared_cookie() -> String {
    format!("{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a new user account
#[utoipa::path(
    post,
    path = "/register",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_signup(&req.name, &req.email, &req.password)?;

    let email = normalize_email(&req.email);
    let password_hash = hash_password(&req.password)?;
    let user = state
        .db
        .create_user_with_email(&email, req.name.trim(), &password_hash)
        .await?;

    let cookie = start_session(&state, user.user_id).await?;
    info!(user_id = %user.user_id, "New account registered");

    let response = AuthResponse {
        user_id: user.user_id,
        email: user.email,
        name: user.name,
    };
    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /login - Login with existing account
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    // 1. Get user by email
    let user_creds = match state.db.get_user_by_email(&normalize_email(&req.email)).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(invalid()),
        Err(e) => return Err(e.into()),
    };

    // 2. Verify password
    if !verify_password(&req.password, &user_creds.hashed_password)? {
        return Err(invalid());
    }

    // 3. Create auth session and cookie
    let cookie = start_session(&state, user_creds.user_id).await?;
    let user = state.db.get_user_by_id(user_creds.user_id).await?;

    let response = AuthResponse {
        user_id: user.user_id,
        email: user.email,
        name: user.name,
    };
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// GET /logout - Invalidate the session and go home
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Logged out, redirected home"))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(auth_session_id) = session_id(&headers) {
        state.db.delete_auth_session(auth_session_id).await?;
    }

    Ok((
        [(header::SET_COOKIE, cleared_cookie())],
        Redirect::to("/?success=logged_out"),
    ))
}

/// POST /account/forgot - Email a password reset link
#[utoipa::path(
    post,
    path = "/account/forgot",
    request_body = ForgotRequest,
    responses((status = 303, description = "Redirected to the login page with an outcome code"))
)]
pub async fn forgot_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ForgotRequest>,
) -> Result<Response, ApiError> {
    // 1. Check the account exists
    let user = match state.db.get_user_by_email(&normalize_email(&req.email)).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Ok(Redirect::to("/login?error=no_account").into_response())
        }
        Err(e) => return Err(e.into()),
    };

    // 2. Set reset token and expiry on the account
    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::seconds(state.config.reset_token_ttl_secs);
    state
        .db
        .set_reset_token(user.user_id, &token, expires_at)
        .await?;

    // 3. Email them the link
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(state.config.public_host.as_str());
    let reset_url = format!("http://{}/account/reset/{}", host, token);
    state
        .mail
        .send(Mail {
            to: user.email.clone(),
            subject: "Password Reset".to_string(),
            body: format!(
                "You requested a password reset. Follow this link to choose a new password:\n\n{}\n\nIf you didn't ask for this, ignore this email.",
                reset_url
            ),
        })
        .await?;
    info!(user_id = %user.user_id, "Password reset link sent");

    // 4. Back to the login page
    Ok(Redirect::to("/login?success=reset_sent").into_response())
}

/// GET /account/reset/{token} - Check a reset token before showing the form
#[utoipa::path(
    get,
    path = "/account/reset/{token}",
    params(("token" = String, Path, description = "Password reset token")),
    responses(
        (status = 200, description = "Token is valid", body = ResetPageResponse),
        (status = 303, description = "Token invalid or expired")
    )
)]
pub async fn reset_form_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    match state.db.get_user_by_reset_token(&token, Utc::now()).await {
        Ok(_) => Ok(Json(ResetPageResponse {
            title: "Reset Password".to_string(),
            token,
        })
        .into_response()),
        Err(PortError::NotFound(_)) => Ok(Redirect::to("/login?error=reset_invalid").into_response()),
        Err(e) => Err(e.into()),
    }
}

/// POST /account/reset/{token} - Set a new password and log in
#[utoipa::path(
    post,
    path = "/account/reset/{token}",
    params(("token" = String, Path, description = "Password reset token")),
    request_body = ResetRequest,
    responses((status = 303, description = "Redirected with an outcome code"))
)]
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<ResetRequest>,
) -> Result<Response, ApiError> {
    // 1. Passwords must match
    if req.password != req.password_confirm {
        return Ok(Redirect::to(&format!("/account/reset/{}?error=password_mismatch", token))
            .into_response());
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Ok(Redirect::to(&format!("/account/reset/{}?error=weak_password", token))
            .into_response());
    }

    // 2. Token must still be valid
    let user = match state.db.get_user_by_reset_token(&token, Utc::now()).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Ok(Redirect::to("/login?error=reset_invalid").into_response())
        }
        Err(e) => return Err(e.into()),
    };

    // 3. Store the new password and clear the token
    let password_hash = hash_password(&req.password)?;
    state.db.update_password(user.user_id, &password_hash).await?;

    // 4. Log them in
    let cookie = start_session(&state, user.user_id).await?;
    info!(user_id = %user.user_id, "Password reset completed");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Redirect::to("/?success=password_reset"),
    )
        .into_response())
}
