//! Read-side queries over the `users` (rider) table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ridehail_types::{Rider, RiderId};

use crate::error::DbError;

/// Read operations on rider accounts.
pub struct RiderStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RiderStore<'a> {
    /// Create a new rider store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a rider by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, rider_id: RiderId) -> Result<Option<Rider>, DbError> {
        let row = sqlx::query_as::<_, RiderRow>(
            "SELECT id, phone_number, name, is_active, created_at FROM users WHERE id = $1",
        )
        .bind(rider_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Rider::from))
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct RiderRow {
    id: Uuid,
    phone_number: String,
    name: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<RiderRow> for Rider {
    fn from(row: RiderRow) -> Self {
        Self {
            id: RiderId(row.id),
            phone_number: row.phone_number,
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}
