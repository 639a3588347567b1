//! Read-side queries over the `drivers` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use ridehail_types::{Driver, DriverId};

use crate::error::DbError;

/// Read operations on the `drivers` table.
pub struct DriverStore<'a> {
    pool: &'a PgPool,
}

impl<'a> DriverStore<'a> {
    /// Create a new driver store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active drivers not currently bound to a ride, by name.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_available(&self) -> Result<Vec<Driver>, DbError> {
        let rows = sqlx::query_as::<_, DriverRow>(
            r"SELECT id, name, phone_number, license_number, vehicle_number,
                     is_active, is_available, created_at
              FROM drivers
              WHERE is_active AND is_available
              ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Driver::from).collect())
    }

    /// Fetch a driver by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, driver_id: DriverId) -> Result<Option<Driver>, DbError> {
        let row = sqlx::query_as::<_, DriverRow>(
            r"SELECT id, name, phone_number, license_number, vehicle_number,
                     is_active, is_available, created_at
              FROM drivers
              WHERE id = $1",
        )
        .bind(driver_id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Driver::from))
    }
}

/// A row from the `drivers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct DriverRow {
    id: Uuid,
    name: String,
    phone_number: String,
    license_number: Option<String>,
    vehicle_number: Option<String>,
    is_active: bool,
    is_available: bool,
    created_at: DateTime<Utc>,
}

impl From<DriverRow> for Driver {
    fn from(row: DriverRow) -> Self {
        Self {
            id: DriverId(row.id),
            name: row.name,
            phone_number: row.phone_number,
            license_number: row.license_number,
            vehicle_number: row.vehicle_number,
            is_active: row.is_active,
            is_available: row.is_available,
            created_at: row.created_at,
        }
    }
}
