pub mod models;
pub mod repository;
pub mod engine;
pub mod memory;

pub use engine::BookingEngine;
pub use memory::{MemoryStore, StoreOp};
pub use models::{Booking, BookingId, NewBooking, NewRide, NewUser, Ride, RideId, RideStatus, User, UserId};

/// Failure kinds surfaced by the booking engine and the catalog helpers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Not enough seats: requested {requested}, available {available}")]
    CapacityError { requested: i32, available: i32 },
    #[error("Not authorized: {0}")]
    AuthorizationError(String),
    #[error(transparent)]
    StorageFault(#[from] StoreError),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Infrastructure failure raised by a store backend.
#[derive(Debug, thiserror::Error)]
#[error("Storage fault: {0}")]
pub struct StoreError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
