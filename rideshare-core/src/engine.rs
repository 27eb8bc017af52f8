use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::models::{Booking, BookingId, NewBooking, RideId, UserId};
use crate::repository::{TransactionalStore, UnitOfWork};
use crate::{CoreError, CoreResult};

/// Reserves and releases seats. Each call runs in exactly one unit of work
/// against the store; the engine itself holds no locks between calls.
pub struct BookingEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for BookingEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TransactionalStore> BookingEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Books `seats_requested` seats on an OPEN ride for `user_id`.
    ///
    /// The seat decrement and the booking insert commit together or not at
    /// all. A reservation that loses a race for the last seats fails with
    /// `CapacityError` and is not retried.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        ride_id: RideId,
        user_id: UserId,
        seats_requested: i32,
    ) -> CoreResult<Booking> {
        if seats_requested <= 0 {
            return Err(CoreError::ValidationError(
                "Seats requested must be greater than zero".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        let outcome = reserve_within(&mut tx, ride_id, user_id, seats_requested).await;
        match outcome {
            Ok(booking) => {
                tx.commit().await?;
                info!(booking_id = booking.id, total_fare = booking.total_fare, "Booking confirmed");
                Ok(booking)
            }
            Err(err) => {
                abort(tx, &err).await;
                Err(err)
            }
        }
    }

    /// Cancels a booking on behalf of the rider who made it and returns its
    /// seats to the ride, whatever the ride's status.
    #[instrument(skip(self))]
    pub async fn release(&self, booking_id: BookingId, requesting_user_id: UserId) -> CoreResult<()> {
        let mut tx = self.store.begin().await?;
        let outcome = release_within(&mut tx, booking_id, requesting_user_id).await;
        match outcome {
            Ok(booking) => {
                tx.commit().await?;
                info!(
                    ride_id = booking.ride_id,
                    seats = booking.seats_booked,
                    "Booking cancelled, seats restored"
                );
                Ok(())
            }
            Err(err) => {
                abort(tx, &err).await;
                Err(err)
            }
        }
    }

    pub async fn list_bookings_for_user(&self, user_id: UserId) -> CoreResult<Vec<Booking>> {
        Ok(self.store.list_bookings_by_user(user_id).await?)
    }
}

async fn reserve_within<T: UnitOfWork>(
    tx: &mut T,
    ride_id: RideId,
    user_id: UserId,
    seats_requested: i32,
) -> CoreResult<Booking> {
    let ride = tx
        .load_for_reservation(ride_id)
        .await?
        .ok_or_else(|| CoreError::NotFoundError("Ride not available".to_string()))?;

    if seats_requested > ride.seats {
        return Err(CoreError::CapacityError {
            requested: seats_requested,
            available: ride.seats,
        });
    }

    let total_fare = ride.fare_for(seats_requested)?;

    if !tx.decrement_seats(ride_id, seats_requested).await? {
        warn!(ride_id, seats_requested, "Seat decrement refused at commit point");
        // `available` is the count seen when the ride was loaded
        return Err(CoreError::CapacityError {
            requested: seats_requested,
            available: ride.seats,
        });
    }

    let booking = tx
        .insert_booking(&NewBooking {
            ride_id,
            user_id,
            seats_booked: seats_requested,
            total_fare,
        })
        .await?;

    Ok(booking)
}

async fn release_within<T: UnitOfWork>(
    tx: &mut T,
    booking_id: BookingId,
    requesting_user_id: UserId,
) -> CoreResult<Booking> {
    let booking = tx
        .load_booking(booking_id)
        .await?
        .ok_or_else(|| CoreError::NotFoundError("Booking not found".to_string()))?;

    if booking.user_id != requesting_user_id {
        warn!(booking_id, requesting_user_id, "Refusing to cancel another rider's booking");
        return Err(CoreError::AuthorizationError(
            "You can cancel only your own booking".to_string(),
        ));
    }

    if !tx.delete_booking(booking_id).await? {
        return Err(CoreError::NotFoundError("Booking not found".to_string()));
    }
    tx.increment_seats(booking.ride_id, booking.seats_booked).await?;

    Ok(booking)
}

async fn abort<T: UnitOfWork>(tx: T, cause: &CoreError) {
    if let Err(rollback_err) = tx.rollback().await {
        warn!(%cause, %rollback_err, "Rollback failed");
    }
}
