pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod ride_repo;
pub mod user_repo;

pub use database::DbClient;
pub use booking_repo::PgUnitOfWork;

use rideshare_core::StoreError;
use sqlx::PgPool;

/// Postgres implementation of every store trait the marketplace uses.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn fault(err: sqlx::Error) -> StoreError {
    StoreError::new(err)
}
