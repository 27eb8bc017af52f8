use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rideshare_core::models::{NewRide, Ride, RideId, RideStatus, UserId};
use rideshare_core::repository::{RideCatalog, RideStore};
use rideshare_core::{StoreError, StoreResult};
use tracing::info;

use crate::{fault, PgUnitOfWork, PostgresStore};

#[derive(sqlx::FromRow)]
struct RideRow {
    id: i64,
    owner_id: i64,
    source: String,
    destination: String,
    seats: i32,
    fare_per_seat: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RideRow> for Ride {
    type Error = StoreError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        Ok(Ride {
            id: row.id,
            owner_id: row.owner_id,
            source: row.source,
            destination: row.destination,
            seats: row.seats,
            fare_per_seat: row.fare_per_seat,
            status: row.status.parse()?,
            created_at: row.created_at,
        })
    }
}

fn into_rides(rows: Vec<RideRow>) -> StoreResult<Vec<Ride>> {
    rows.into_iter().map(Ride::try_from).collect()
}

#[async_trait]
impl RideStore for PgUnitOfWork {
    async fn load_for_reservation(&mut self, ride_id: RideId) -> StoreResult<Option<Ride>> {
        // Row lock serializes this reservation against other reservations
        // and against the owner cancelling the ride.
        let row = sqlx::query_as::<_, RideRow>(
            r#"
            SELECT id, owner_id, source, destination, seats, fare_per_seat, status, created_at
            FROM rides
            WHERE id = $1 AND status = $2
            FOR UPDATE
            "#,
        )
        .bind(ride_id)
        .bind(RideStatus::Open.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(fault)?;

        row.map(Ride::try_from).transpose()
    }

    async fn decrement_seats(&mut self, ride_id: RideId, seats: i32) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rides SET seats = seats - $1
            WHERE id = $2 AND status = $3 AND seats >= $1
            "#,
        )
        .bind(seats)
        .bind(ride_id)
        .bind(RideStatus::Open.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(fault)?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_seats(&mut self, ride_id: RideId, seats: i32) -> StoreResult<()> {
        sqlx::query("UPDATE rides SET seats = seats + $1 WHERE id = $2")
            .bind(seats)
            .bind(ride_id)
            .execute(&mut *self.tx)
            .await
            .map_err(fault)?;
        Ok(())
    }
}

#[async_trait]
impl RideCatalog for PostgresStore {
    async fn publish_ride(&self, ride: &NewRide) -> StoreResult<Ride> {
        let row = sqlx::query_as::<_, RideRow>(
            r#"
            INSERT INTO rides (owner_id, source, destination, seats, fare_per_seat, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, source, destination, seats, fare_per_seat, status, created_at
            "#,
        )
        .bind(ride.owner_id)
        .bind(&ride.source)
        .bind(&ride.destination)
        .bind(ride.seats)
        .bind(ride.fare_per_seat)
        .bind(RideStatus::Open.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(fault)?;

        info!(ride_id = row.id, owner_id = row.owner_id, "Ride published");
        Ride::try_from(row)
    }

    async fn find_ride(&self, ride_id: RideId) -> StoreResult<Option<Ride>> {
        let row = sqlx::query_as::<_, RideRow>(
            "SELECT id, owner_id, source, destination, seats, fare_per_seat, status, created_at FROM rides WHERE id = $1",
        )
        .bind(ride_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(fault)?;

        row.map(Ride::try_from).transpose()
    }

    async fn list_bookable_rides(&self) -> StoreResult<Vec<Ride>> {
        let rows = sqlx::query_as::<_, RideRow>(
            r#"
            SELECT id, owner_id, source, destination, seats, fare_per_seat, status, created_at
            FROM rides
            WHERE status = $1 AND seats > 0
            ORDER BY id DESC
            "#,
        )
        .bind(RideStatus::Open.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;

        into_rides(rows)
    }

    async fn search_rides(&self, source: &str, destination: &str) -> StoreResult<Vec<Ride>> {
        let rows = sqlx::query_as::<_, RideRow>(
            r#"
            SELECT id, owner_id, source, destination, seats, fare_per_seat, status, created_at
            FROM rides
            WHERE source = $1 AND destination = $2 AND status = $3 AND seats > 0
            ORDER BY id DESC
            "#,
        )
        .bind(source)
        .bind(destination)
        .bind(RideStatus::Open.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;

        into_rides(rows)
    }

    async fn list_rides_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Ride>> {
        let rows = sqlx::query_as::<_, RideRow>(
            r#"
            SELECT id, owner_id, source, destination, seats, fare_per_seat, status, created_at
            FROM rides
            WHERE owner_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;

        into_rides(rows)
    }

    async fn cancel_ride(&self, ride_id: RideId, owner_id: UserId) -> StoreResult<bool> {
        // Waits on any reservation holding the row lock, so a ride is never
        // cancelled halfway through someone booking it.
        let result = sqlx::query(
            "UPDATE rides SET status = $1 WHERE id = $2 AND owner_id = $3 AND status = $4",
        )
        .bind(RideStatus::Cancelled.as_str())
        .bind(ride_id)
        .bind(owner_id)
        .bind(RideStatus::Open.as_str())
        .execute(&self.pool)
        .await
        .map_err(fault)?;

        let cancelled = result.rows_affected() > 0;
        if cancelled {
            info!(ride_id, owner_id, "Ride cancelled");
        }
        Ok(cancelled)
    }
}
