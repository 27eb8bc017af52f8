use async_trait::async_trait;

use crate::models::{Booking, BookingId, NewBooking, NewRide, NewUser, Ride, RideId, User, UserId};
use crate::StoreResult;

/// Ride rows as seen from inside an open unit of work.
#[async_trait]
pub trait RideStore: Send {
    /// Returns the ride only while it is OPEN, locking it until the unit of
    /// work ends. A sold-out ride comes back with `seats == 0`.
    async fn load_for_reservation(&mut self, ride_id: RideId) -> StoreResult<Option<Ride>>;

    /// Conditional decrement enforced by the store: succeeds only if at least
    /// `seats` remain and the ride is still OPEN at execution time.
    async fn decrement_seats(&mut self, ride_id: RideId, seats: i32) -> StoreResult<bool>;

    async fn increment_seats(&mut self, ride_id: RideId, seats: i32) -> StoreResult<()>;
}

/// Booking rows as seen from inside an open unit of work.
#[async_trait]
pub trait BookingStore: Send {
    async fn insert_booking(&mut self, booking: &NewBooking) -> StoreResult<Booking>;

    /// Locks the booking row until the unit of work ends.
    async fn load_booking(&mut self, booking_id: BookingId) -> StoreResult<Option<Booking>>;

    /// Returns false when no row was removed.
    async fn delete_booking(&mut self, booking_id: BookingId) -> StoreResult<bool>;
}

/// An all-or-nothing scope over ride and booking mutations.
///
/// Dropping a unit of work without calling `commit` discards every change
/// made through it.
#[async_trait]
pub trait UnitOfWork: RideStore + BookingStore + Sized {
    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}

/// Entry point the booking engine runs against.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    type Tx: UnitOfWork;

    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Bookings of one rider, most recent first. Runs outside any unit of work.
    async fn list_bookings_by_user(&self, user_id: UserId) -> StoreResult<Vec<Booking>>;
}

/// Publishing, searching and cancelling rides.
#[async_trait]
pub trait RideCatalog: Send + Sync {
    async fn publish_ride(&self, ride: &NewRide) -> StoreResult<Ride>;

    async fn find_ride(&self, ride_id: RideId) -> StoreResult<Option<Ride>>;

    /// OPEN rides with seats left, most recent first.
    async fn list_bookable_rides(&self) -> StoreResult<Vec<Ride>>;

    /// Like `list_bookable_rides`, restricted to an exact source/destination pair.
    async fn search_rides(&self, source: &str, destination: &str) -> StoreResult<Vec<Ride>>;

    /// Every ride of an owner regardless of status, most recent first.
    async fn list_rides_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Ride>>;

    /// OPEN -> CANCELLED. Returns false if the ride is unknown, owned by
    /// someone else, or already cancelled.
    async fn cancel_ride(&self, ride_id: RideId, owner_id: UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns `None` when the email is already registered.
    async fn register_user(&self, user: &NewUser) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<User>>;
}

/// Everything the HTTP gateway needs from a backend.
pub trait MarketplaceStore: TransactionalStore + RideCatalog + UserDirectory + 'static {}

impl<T> MarketplaceStore for T where T: TransactionalStore + RideCatalog + UserDirectory + 'static {}
