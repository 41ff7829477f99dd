use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest, RegisteredUser},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo::User,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn msg(status: StatusCode, text: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": text })))
}

/// POST /api/auth/register
///
/// Validation and duplicate-email failures both map to 400; only the message
/// text distinguishes them. The password is hashed here, server-side, and the
/// response never carries a password field.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<RegisteredUser>, (StatusCode, Json<Value>)> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty()
        || !is_valid_email(&payload.email)
        || payload.password.len() < 8
    {
        warn!(email = %payload.email, "registration payload failed validation");
        return Err(msg(StatusCode::BAD_REQUEST, "Invalid input data"));
    }

    match state.users.find_by_email(&payload.email).await {
        Ok(Some(_)) => {
            warn!(email = %payload.email, "email already registered");
            return Err(msg(
                StatusCode::BAD_REQUEST,
                "User with this email already exists",
            ));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(msg(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create account",
            ));
        }
    }

    let hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err(msg(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create account",
            ));
        }
    };

    let user = match state
        .users
        .create(payload.name.trim(), &payload.email, &hash)
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(msg(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create account",
            ));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(RegisteredUser {
        id: user.id,
        name: user.name,
        email: user.email,
        image: user.image,
        created_at: user.created_at,
    }))
}

/// POST /api/auth/login
///
/// The credentials flow never leaks why authorization failed: unknown email,
/// missing password hash, wrong password and internal lookup errors all
/// collapse into the same 401.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<Value>)> {
    payload.email = payload.email.trim().to_lowercase();

    let denied = msg(StatusCode::UNAUTHORIZED, "Invalid credentials");

    if !is_valid_email(&payload.email) || payload.password.is_empty() {
        warn!(email = %payload.email, "login payload failed validation");
        return Err(denied);
    }

    let user = match state.users.find_by_email(&payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err(denied);
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(denied);
        }
    };

    // OAuth-only accounts have no password hash and cannot use this flow.
    let Some(hash) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "login attempt on oauth-only account");
        return Err(denied);
    };

    match verify_password(&payload.password, hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(email = %payload.email, user_id = %user.id, "login invalid password");
            return Err(denied);
        }
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err(denied);
        }
    }

    let keys = JwtKeys::from_ref(&state);
    let tokens = issue_tokens(&keys, &user)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(tokens))
}

/// POST /api/auth/refresh
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<Value>)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh token rejected");
        msg(StatusCode::UNAUTHORIZED, "Invalid or expired token")
    })?;

    // Reload the user so refreshed tokens carry the current projection.
    let user = match state.users.find_by_id(claims.sub).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(user_id = %claims.sub, "refresh for unknown user");
            return Err(msg(StatusCode::UNAUTHORIZED, "User not found"));
        }
        Err(e) => {
            error!(error = %e, "find_by_id failed");
            return Err(msg(StatusCode::UNAUTHORIZED, "User not found"));
        }
    };

    Ok(Json(issue_tokens(&keys, &user)?))
}

/// GET /api/me — identity comes straight from the token claims; no store
/// round trip.
#[instrument(skip_all)]
pub async fn get_me(AuthUser(claims): AuthUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: claims.sub,
        name: claims.name.unwrap_or_default(),
        email: claims.email.unwrap_or_default(),
        image: claims.image,
    })
}

pub(crate) fn issue_tokens(
    keys: &JwtKeys,
    user: &User,
) -> Result<AuthResponse, (StatusCode, Json<Value>)> {
    let access_token = keys.sign_access(user).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        msg(StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
    })?;
    let refresh_token = keys.sign_refresh(user).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        msg(StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
        },
    })
}
