use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::{
    auth::{
        dto::AuthResponse,
        handlers::{issue_tokens, msg},
        jwt::JwtKeys,
    },
    config::GithubConfig,
    state::AppState,
};

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_EMAILS_URL: &str = "https://api.github.com/user/emails";

pub fn github_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/github", get(github_start))
        .route("/auth/github/callback", get(github_callback))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubProfile {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

fn build_authorize_url(cfg: &GithubConfig, state_token: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(GITHUB_AUTHORIZE_URL)?;
    url.query_pairs_mut()
        .append_pair("client_id", &cfg.client_id)
        .append_pair("redirect_uri", &cfg.redirect_url)
        .append_pair("scope", "read:user user:email")
        .append_pair("state", state_token);
    Ok(url.into())
}

/// GET /api/auth/github — redirect to GitHub with a signed state parameter.
#[instrument(skip(state))]
pub async fn github_start(
    State(state): State<AppState>,
) -> Result<Redirect, (StatusCode, Json<Value>)> {
    let Some(gh) = state.config.github.as_ref() else {
        warn!("github oauth requested but not configured");
        return Err(msg(
            StatusCode::INTERNAL_SERVER_ERROR,
            "OAuth is not configured",
        ));
    };

    let keys = JwtKeys::from_ref(&state);
    let state_token = keys.sign_oauth_state().map_err(|e| {
        error!(error = %e, "sign oauth state failed");
        msg(StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
    })?;

    let url = build_authorize_url(gh, &state_token).map_err(|e| {
        error!(error = %e, "build authorize url failed");
        msg(StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
    })?;

    Ok(Redirect::temporary(&url))
}

/// GET /api/auth/github/callback — exchange the code, fetch the profile,
/// upsert the user and issue a token pair. Every upstream failure is logged
/// and collapsed into a generic denial.
#[instrument(skip(state, query))]
pub async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<Value>)> {
    let denied = msg(StatusCode::UNAUTHORIZED, "Authentication denied");

    let Some(gh) = state.config.github.as_ref() else {
        warn!("github oauth callback but not configured");
        return Err(msg(
            StatusCode::INTERNAL_SERVER_ERROR,
            "OAuth is not configured",
        ));
    };

    let keys = JwtKeys::from_ref(&state);
    if let Err(e) = keys.verify_oauth_state(&query.state) {
        warn!(error = %e, "oauth state rejected");
        return Err(denied);
    }

    let token = match exchange_code(&state.http, gh, &query.code).await {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "github code exchange failed");
            return Err(denied);
        }
    };

    let (profile, email) = match fetch_profile(&state.http, &token).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "github profile fetch failed");
            return Err(denied);
        }
    };

    let display_name = profile.name.unwrap_or(profile.login);
    let user = match state
        .users
        .upsert_oauth(
            &display_name,
            &email.trim().to_lowercase(),
            profile.avatar_url.as_deref(),
            "github",
            &profile.id.to_string(),
        )
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "oauth upsert failed");
            return Err(denied);
        }
    };

    info!(user_id = %user.id, email = %user.email, "user logged in via github");
    Ok(Json(issue_tokens(&keys, &user)?))
}

async fn exchange_code(
    http: &reqwest::Client,
    gh: &GithubConfig,
    code: &str,
) -> anyhow::Result<String> {
    let resp = http
        .post(GITHUB_TOKEN_URL)
        .header(reqwest::header::ACCEPT, "application/json")
        .json(&json!({
            "client_id": gh.client_id,
            "client_secret": gh.client_secret,
            "code": code,
        }))
        .send()
        .await?
        .error_for_status()?;

    let body: TokenResponse = resp.json().await?;
    body.access_token
        .ok_or_else(|| anyhow::anyhow!("token response without access_token"))
}

/// Returns the profile and a usable email. GitHub omits the email from the
/// profile when it is private, in which case the emails endpoint is consulted
/// for the primary verified address.
async fn fetch_profile(
    http: &reqwest::Client,
    token: &str,
) -> anyhow::Result<(GithubProfile, String)> {
    let profile: GithubProfile = http
        .get(GITHUB_USER_URL)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(email) = profile.email.clone() {
        return Ok((profile, email));
    }

    let emails: Vec<GithubEmail> = http
        .get(GITHUB_EMAILS_URL)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let email = emails
        .into_iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email)
        .ok_or_else(|| anyhow::anyhow!("no primary verified email on github account"))?;

    Ok((profile, email))
}
