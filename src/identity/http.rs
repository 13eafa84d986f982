//! Identity HTTP API.
//!
//! - `POST /signup`: create an account
//! - `POST /login`: exchange credentials for an access token
//! - `GET /users`: every account, id and email only
//! - `GET /profile`: caller's email plus their catalog items (Bearer token)
//! - `GET /health`: liveness

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::auth::{hash_credential, verify_credential};
use super::IdentityContext;
use crate::envelope::ItemSummary;
use crate::error::ApiError;
use crate::storage::StorageError;

/// Body of `POST /signup` and `POST /login`.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct UserSummary {
    id: i64,
    email: String,
}

#[derive(Debug, Serialize)]
struct UsersResponse {
    users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    email: String,
    products: Vec<ItemSummary>,
}

/// Account id taken from a verified Bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount(pub i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    IdentityContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = IdentityContext::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_string()))?;

        let account_id = ctx.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "Rejected access token");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        Ok(Self(account_id))
    }
}

/// Build the identity router.
pub fn router(ctx: IdentityContext) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/users", get(list_users))
        .route("/profile", get(profile))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

fn credentials(body: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, ApiError> {
    let Json(creds) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if creds.email.trim().is_empty() || creds.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    Ok(creds)
}

async fn signup(
    State(ctx): State<IdentityContext>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let creds = credentials(body)?;
    let credential = hash_credential(&creds.password)?;

    let account = ctx
        .accounts
        .create(&creds.email, &credential)
        .await
        .map_err(|e| match e {
            StorageError::Duplicate { .. } => {
                ApiError::Conflict("Email already registered".to_string())
            }
            other => ApiError::Storage(other),
        })?;

    info!(account_id = account.id, "Account created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User created successfully" })),
    ))
}

async fn login(
    State(ctx): State<IdentityContext>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let creds = credentials(body)?;

    let account = ctx
        .accounts
        .find_by_email(&creds.email)
        .await?
        .filter(|a| verify_credential(&creds.password, &a.credential))
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let access_token = ctx.tokens.issue(account.id)?;
    Ok(Json(TokenResponse { access_token }))
}

async fn list_users(State(ctx): State<IdentityContext>) -> Result<Json<UsersResponse>, ApiError> {
    let users = ctx
        .accounts
        .list_all()
        .await?
        .into_iter()
        .map(|a| UserSummary {
            id: a.id,
            email: a.email,
        })
        .collect();
    Ok(Json(UsersResponse { users }))
}

/// Caller's email plus whatever one bridge cycle returns for them.
///
/// An account that no longer exists gets 404 before anything is published,
/// so that call runs no bridge cycle at all.
async fn profile(
    State(ctx): State<IdentityContext>,
    AuthenticatedAccount(account_id): AuthenticatedAccount,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = ctx
        .accounts
        .get(account_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let products = ctx.requester.request_items(account.id).await?;

    Ok(Json(ProfileResponse {
        email: account.email,
        products,
    }))
}
