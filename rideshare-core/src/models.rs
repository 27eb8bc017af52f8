use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, StoreError};

pub type UserId = i64;
pub type RideId = i64;
pub type BookingId = i64;

// Column widths in migrations/0001_create_marketplace_tables.sql, in characters.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 150;
pub const MAX_PLACE_LEN: usize = 80;

fn check_len(field: &str, value: &str, max: usize) -> CoreResult<()> {
    if value.chars().count() > max {
        return Err(CoreError::ValidationError(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// A registered marketplace member. Riders and ride owners share this shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    /// Trims both fields and rejects blanks or values wider than their column.
    pub fn new(name: &str, email: &str) -> CoreResult<Self> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(CoreError::ValidationError("name and email are required".to_string()));
        }
        check_len("name", name, MAX_NAME_LEN)?;
        check_len("email", email, MAX_EMAIL_LEN)?;
        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

/// Ride lifecycle. The only transition is OPEN -> CANCELLED, driven by the owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Open,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Open => "OPEN",
            RideStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(RideStatus::Open),
            "CANCELLED" => Ok(RideStatus::Cancelled),
            other => Err(StoreError::new(format!("unknown ride status {other:?}"))),
        }
    }
}

/// A published ride. `seats` is the remaining capacity, not the original one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: RideId,
    pub owner_id: UserId,
    pub source: String,
    pub destination: String,
    pub seats: i32,
    pub fare_per_seat: i64,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
}

impl Ride {
    pub fn is_bookable(&self) -> bool {
        self.status == RideStatus::Open && self.seats > 0
    }

    /// Fare for `seats` at this ride's current per-seat price.
    pub fn fare_for(&self, seats: i32) -> CoreResult<i64> {
        self.fare_per_seat
            .checked_mul(i64::from(seats))
            .ok_or_else(|| CoreError::ValidationError(format!("fare for {seats} seats overflows")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRide {
    pub owner_id: UserId,
    pub source: String,
    pub destination: String,
    pub seats: i32,
    pub fare_per_seat: i64,
}

impl NewRide {
    pub fn new(
        owner_id: UserId,
        source: &str,
        destination: &str,
        seats: i32,
        fare_per_seat: i64,
    ) -> CoreResult<Self> {
        let source = source.trim();
        let destination = destination.trim();
        if owner_id <= 0
            || source.is_empty()
            || destination.is_empty()
            || seats <= 0
            || fare_per_seat <= 0
        {
            return Err(CoreError::ValidationError(
                "ownerId, source, destination, seats, farePerSeat are required".to_string(),
            ));
        }
        check_len("source", source, MAX_PLACE_LEN)?;
        check_len("destination", destination, MAX_PLACE_LEN)?;
        Ok(Self {
            owner_id,
            source: source.to_string(),
            destination: destination.to_string(),
            seats,
            fare_per_seat,
        })
    }
}

/// A confirmed seat reservation. Seats and fare are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub ride_id: RideId,
    pub user_id: UserId,
    pub seats_booked: i32,
    pub total_fare: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub ride_id: RideId,
    pub user_id: UserId,
    pub seats_booked: i32,
    pub total_fare: i64,
}
