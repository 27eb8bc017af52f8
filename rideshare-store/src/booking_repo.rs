use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rideshare_core::models::{Booking, BookingId, NewBooking, UserId};
use rideshare_core::repository::{BookingStore, TransactionalStore, UnitOfWork};
use rideshare_core::StoreResult;
use sqlx::Postgres;

use crate::{fault, PostgresStore};

/// A Postgres transaction. Dropped without `commit`, sqlx rolls it back.
pub struct PgUnitOfWork {
    pub(crate) tx: sqlx::Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    ride_id: i64,
    user_id: i64,
    seats_booked: i32,
    total_fare: i64,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            ride_id: row.ride_id,
            user_id: row.user_id,
            seats_booked: row.seats_booked,
            total_fare: row.total_fare,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl BookingStore for PgUnitOfWork {
    async fn insert_booking(&mut self, booking: &NewBooking) -> StoreResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (ride_id, user_id, seats_booked, total_fare)
            VALUES ($1, $2, $3, $4)
            RETURNING id, ride_id, user_id, seats_booked, total_fare, created_at
            "#,
        )
        .bind(booking.ride_id)
        .bind(booking.user_id)
        .bind(booking.seats_booked)
        .bind(booking.total_fare)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(fault)?;

        Ok(row.into())
    }

    async fn load_booking(&mut self, booking_id: BookingId) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, ride_id, user_id, seats_booked, total_fare, created_at
            FROM bookings
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(fault)?;

        Ok(row.map(Booking::from))
    }

    async fn delete_booking(&mut self, booking_id: BookingId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(booking_id)
            .execute(&mut *self.tx)
            .await
            .map_err(fault)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(fault)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await.map_err(fault)
    }
}

#[async_trait]
impl TransactionalStore for PostgresStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        let tx = self.pool.begin().await.map_err(fault)?;
        Ok(PgUnitOfWork { tx })
    }

    async fn list_bookings_by_user(&self, user_id: UserId) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, ride_id, user_id, seats_booked, total_fare, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}
