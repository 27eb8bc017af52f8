use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use rideshare_core::models::{Booking, BookingId, RideId, UserId};
use rideshare_core::repository::MarketplaceStore;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::rides::CancelledResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub ride_id: RideId,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub seats: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderQuery {
    pub user_id: Option<UserId>,
}

pub fn routes<S: MarketplaceStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/bookings", post(create_booking::<S>))
        // GET takes a user id, DELETE a booking id
        .route(
            "/bookings/{id}",
            get(user_bookings::<S>).delete(cancel_booking::<S>),
        )
}

/// POST /bookings
async fn create_booking<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Json(req), _): WithRejection<Json<CreateBookingRequest>, AppError>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    if req.user_id <= 0 || req.ride_id <= 0 {
        return Err(AppError::ValidationError(
            "userId, rideId and seats are required".to_string(),
        ));
    }

    if state.store.find_user(req.user_id).await?.is_none() {
        return Err(AppError::NotFoundError("User not found".to_string()));
    }

    let booking = state.engine.reserve(req.ride_id, req.user_id, req.seats).await?;
    info!(booking_id = booking.id, ride_id = booking.ride_id, "Booking created");

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookings/{userId}
async fn user_bookings<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Path(user_id), _): WithRejection<Path<UserId>, AppError>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.engine.list_bookings_for_user(user_id).await?))
}

/// DELETE /bookings/{bookingId}?userId=
async fn cancel_booking<S: MarketplaceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Path(booking_id), _): WithRejection<Path<BookingId>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<RiderQuery>, AppError>,
) -> Result<Json<CancelledResponse>, AppError> {
    let user_id = query
        .user_id
        .ok_or_else(|| AppError::ValidationError("userId query parameter is required".to_string()))?;

    state.engine.release(booking_id, user_id).await?;
    Ok(Json(CancelledResponse { cancelled: true }))
}
