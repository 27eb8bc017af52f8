use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use rideshare_core::models::{NewRide, Ride, RideId, UserId};
use rideshare_core::repository::MarketplaceStore;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRideRequest {
    #[serde(default)]
    pub owner_id: UserId,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub seats: i32,
    #[serde(default)]
    pub fare_per_seat: i64,
}

#[derive(Debug, Serialize)]
pub struct PublishRideResponse {
    pub id: RideId,
}

#[derive(Debug, Deserialize)]
pub struct RideSearchQuery {
    pub source: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub owner_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct CancelledResponse {
    pub cancelled: bool,
}

pub fn routes<S: MarketplaceStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/rides", get(list_rides::<S>).post(publish_ride::<S>))
        .route("/rides/owner/{owner_id}", get(owner_rides::<S>))
        .route("/rides/{id}", delete(cancel_ride::<S>))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /rides
async fn publish_ride<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Json(req), _): WithRejection<Json<PublishRideRequest>, AppError>,
) -> Result<(StatusCode, Json<PublishRideResponse>), AppError> {
    let ride = NewRide::new(
        req.owner_id,
        &req.source,
        &req.destination,
        req.seats,
        req.fare_per_seat,
    )?;

    if state.store.find_user(ride.owner_id).await?.is_none() {
        return Err(AppError::NotFoundError("Owner not found".to_string()));
    }

    let published = state.store.publish_ride(&ride).await?;
    Ok((StatusCode::CREATED, Json(PublishRideResponse { id: published.id })))
}

/// GET /rides?source=&destination=
/// Bookable rides only; the route filter applies when both ends are given.
async fn list_rides<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Query(query), _): WithRejection<Query<RideSearchQuery>, AppError>,
) -> Result<Json<Vec<Ride>>, AppError> {
    let rides = match (non_blank(&query.source), non_blank(&query.destination)) {
        (Some(source), Some(destination)) => state.store.search_rides(source, destination).await?,
        _ => state.store.list_bookable_rides().await?,
    };
    Ok(Json(rides))
}

/// GET /rides/owner/{owner_id}
async fn owner_rides<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Path(owner_id), _): WithRejection<Path<UserId>, AppError>,
) -> Result<Json<Vec<Ride>>, AppError> {
    Ok(Json(state.store.list_rides_by_owner(owner_id).await?))
}

/// DELETE /rides/{id}?ownerId=
async fn cancel_ride<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Path(ride_id), _): WithRejection<Path<RideId>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<OwnerQuery>, AppError>,
) -> Result<Json<CancelledResponse>, AppError> {
    let owner_id = query
        .owner_id
        .ok_or_else(|| AppError::ValidationError("ownerId query parameter is required".to_string()))?;

    if !state.store.cancel_ride(ride_id, owner_id).await? {
        return Err(AppError::NotFoundError("Ride not found or not owned by user".to_string()));
    }
    Ok(Json(CancelledResponse { cancelled: true }))
}
