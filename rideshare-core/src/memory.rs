use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{
    Booking, BookingId, NewBooking, NewRide, NewUser, Ride, RideId, RideStatus, User, UserId,
};
use crate::repository::{
    BookingStore, RideCatalog, RideStore, TransactionalStore, UnitOfWork, UserDirectory,
};
use crate::{StoreError, StoreResult};

/// Store operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    LoadRide,
    DecrementSeats,
    IncrementSeats,
    InsertBooking,
    LoadBooking,
    DeleteBooking,
    Commit,
}

#[derive(Debug, Default, Clone)]
struct MemoryState {
    users: BTreeMap<UserId, User>,
    rides: BTreeMap<RideId, Ride>,
    bookings: BTreeMap<BookingId, Booking>,
    last_user_id: UserId,
    last_ride_id: RideId,
    last_booking_id: BookingId,
}

/// Process-local store with the same transactional contract as the Postgres one.
///
/// A unit of work owns the single state lock for its whole lifetime and
/// edits a staged copy, so units of work are serialized and a dropped or
/// rolled back one leaves no trace.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Mutex<Vec<StoreOp>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next execution of `op` fails with a storage fault.
    pub async fn fail_next(&self, op: StoreOp) {
        self.faults.lock().await.push(op);
    }
}

async fn check_fault(faults: &Mutex<Vec<StoreOp>>, op: StoreOp) -> StoreResult<()> {
    let mut pending = faults.lock().await;
    if let Some(pos) = pending.iter().position(|p| *p == op) {
        pending.remove(pos);
        return Err(StoreError::new(format!("injected fault on {op:?}")));
    }
    Ok(())
}

fn newest_first<T>(rows: impl DoubleEndedIterator<Item = T>) -> Vec<T> {
    rows.rev().collect()
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    faults: Arc<Mutex<Vec<StoreOp>>>,
}

#[async_trait]
impl RideStore for MemoryUnitOfWork {
    async fn load_for_reservation(&mut self, ride_id: RideId) -> StoreResult<Option<Ride>> {
        check_fault(&self.faults, StoreOp::LoadRide).await?;
        Ok(self
            .staged
            .rides
            .get(&ride_id)
            .filter(|ride| ride.status == RideStatus::Open)
            .cloned())
    }

    async fn decrement_seats(&mut self, ride_id: RideId, seats: i32) -> StoreResult<bool> {
        check_fault(&self.faults, StoreOp::DecrementSeats).await?;
        match self.staged.rides.get_mut(&ride_id) {
            Some(ride) if ride.status == RideStatus::Open && ride.seats >= seats => {
                ride.seats -= seats;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_seats(&mut self, ride_id: RideId, seats: i32) -> StoreResult<()> {
        check_fault(&self.faults, StoreOp::IncrementSeats).await?;
        if let Some(ride) = self.staged.rides.get_mut(&ride_id) {
            ride.seats += seats;
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryUnitOfWork {
    async fn insert_booking(&mut self, booking: &NewBooking) -> StoreResult<Booking> {
        check_fault(&self.faults, StoreOp::InsertBooking).await?;
        if !self.staged.rides.contains_key(&booking.ride_id) {
            return Err(StoreError::new(format!("ride {} does not exist", booking.ride_id)));
        }
        if !self.staged.users.contains_key(&booking.user_id) {
            return Err(StoreError::new(format!("user {} does not exist", booking.user_id)));
        }
        self.staged.last_booking_id += 1;
        let row = Booking {
            id: self.staged.last_booking_id,
            ride_id: booking.ride_id,
            user_id: booking.user_id,
            seats_booked: booking.seats_booked,
            total_fare: booking.total_fare,
            created_at: Utc::now(),
        };
        self.staged.bookings.insert(row.id, row.clone());
        Ok(row)
    }

    async fn load_booking(&mut self, booking_id: BookingId) -> StoreResult<Option<Booking>> {
        check_fault(&self.faults, StoreOp::LoadBooking).await?;
        Ok(self.staged.bookings.get(&booking_id).cloned())
    }

    async fn delete_booking(&mut self, booking_id: BookingId) -> StoreResult<bool> {
        check_fault(&self.faults, StoreOp::DeleteBooking).await?;
        Ok(self.staged.bookings.remove(&booking_id).is_some())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> StoreResult<()> {
        check_fault(&self.faults, StoreOp::Commit).await?;
        let MemoryUnitOfWork { mut guard, staged, .. } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryUnitOfWork {
            guard,
            staged,
            faults: Arc::clone(&self.faults),
        })
    }

    async fn list_bookings_by_user(&self, user_id: UserId) -> StoreResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state.bookings.values().filter(|b| b.user_id == user_id).cloned(),
        ))
    }
}

#[async_trait]
impl RideCatalog for MemoryStore {
    async fn publish_ride(&self, ride: &NewRide) -> StoreResult<Ride> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&ride.owner_id) {
            return Err(StoreError::new(format!("user {} does not exist", ride.owner_id)));
        }
        state.last_ride_id += 1;
        let row = Ride {
            id: state.last_ride_id,
            owner_id: ride.owner_id,
            source: ride.source.clone(),
            destination: ride.destination.clone(),
            seats: ride.seats,
            fare_per_seat: ride.fare_per_seat,
            status: RideStatus::Open,
            created_at: Utc::now(),
        };
        state.rides.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_ride(&self, ride_id: RideId) -> StoreResult<Option<Ride>> {
        Ok(self.state.lock().await.rides.get(&ride_id).cloned())
    }

    async fn list_bookable_rides(&self) -> StoreResult<Vec<Ride>> {
        let state = self.state.lock().await;
        Ok(newest_first(state.rides.values().filter(|r| r.is_bookable()).cloned()))
    }

    async fn search_rides(&self, source: &str, destination: &str) -> StoreResult<Vec<Ride>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state
                .rides
                .values()
                .filter(|r| r.is_bookable() && r.source == source && r.destination == destination)
                .cloned(),
        ))
    }

    async fn list_rides_by_owner(&self, owner_id: UserId) -> StoreResult<Vec<Ride>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state.rides.values().filter(|r| r.owner_id == owner_id).cloned(),
        ))
    }

    async fn cancel_ride(&self, ride_id: RideId, owner_id: UserId) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.rides.get_mut(&ride_id) {
            Some(ride) if ride.owner_id == owner_id && ride.status == RideStatus::Open => {
                ride.status = RideStatus::Cancelled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn register_user(&self, user: &NewUser) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Ok(None);
        }
        state.last_user_id += 1;
        let row = User {
            id: state.last_user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        state.users.insert(row.id, row.clone());
        Ok(Some(row))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }
}
