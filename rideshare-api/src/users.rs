use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use rideshare_core::models::{NewUser, User, UserId};
use rideshare_core::repository::MarketplaceStore;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub email: Option<String>,
}

pub fn routes<S: MarketplaceStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/users/register", post(register::<S>))
        .route("/users/login", get(login::<S>))
        .route("/users/{id}", get(get_user::<S>))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users/register
/// Registering an email twice hands back the existing user.
async fn register<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let new_user = NewUser::new(&req.name, &req.email)?;

    if let Some(existing) = state.store.find_user_by_email(&new_user.email).await? {
        return Ok((StatusCode::OK, Json(existing)));
    }

    match state.store.register_user(&new_user).await? {
        Some(user) => Ok((StatusCode::CREATED, Json(user))),
        // Lost a race with a concurrent registration of the same email
        None => state
            .store
            .find_user_by_email(&new_user.email)
            .await?
            .map(|existing| (StatusCode::OK, Json(existing)))
            .ok_or_else(|| AppError::InternalServerError("user vanished after conflict".to_string())),
    }
}

/// GET /users/login?email=
async fn login<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Query(query), _): WithRejection<Query<LoginQuery>, AppError>,
) -> Result<Json<User>, AppError> {
    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::ValidationError("email query parameter is required".to_string()))?;

    state
        .store
        .find_user_by_email(email)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))
}

/// GET /users/{id}
async fn get_user<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Path(user_id), _): WithRejection<Path<UserId>, AppError>,
) -> Result<Json<User>, AppError> {
    state
        .store
        .find_user(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))
}
