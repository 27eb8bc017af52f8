use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rideshare_core::models::{NewUser, User, UserId};
use rideshare_core::repository::UserDirectory;
use rideshare_core::StoreResult;
use tracing::info;

use crate::{fault, PostgresStore};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserDirectory for PostgresStore {
    async fn register_user(&self, user: &NewUser) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(fault)?;

        if let Some(row) = &row {
            info!(user_id = row.id, "User registered");
        }
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(fault)?;

        Ok(row.map(User::from))
    }

    async fn find_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, email, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(fault)?;

        Ok(row.map(User::from))
    }
}
