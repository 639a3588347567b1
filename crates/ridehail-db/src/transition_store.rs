//! Statements that run inside a ride transition.
//!
//! A [`TransitionStore`] borrows the connection of one open transaction. Every
//! read that feeds a transition decision goes through a `FOR UPDATE` lock
//! here, and every status write is guarded by a `WHERE status = ...` clause so
//! a lost race shows up as zero affected rows instead of a silent overwrite.
//!
//! Lock order is always ride first, then driver.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use ridehail_types::{DispatcherId, DriverId, Place, Ride, RideBilling, RideId, RideStatus, RiderId};

use crate::error::DbError;
use crate::ride_store::{RideRow, parse_status, ride_columns};

/// Columns read when locking a ride. `locked_at` is the transaction clock.
macro_rules! lock_ride_sql {
    ($($filter:literal)*) => {
        concat!(
            "SELECT status::TEXT AS status, started_at, now() AS locked_at FROM rides ",
            $($filter,)*
            " FOR UPDATE"
        )
    };
}

/// A ride row held under an exclusive lock for the rest of the transaction.
#[derive(Debug, Clone, Copy)]
pub struct LockedRide {
    /// Status at lock time.
    pub status: RideStatus,
    /// Start time, set once the ride is `in_progress`.
    pub started_at: Option<DateTime<Utc>>,
    /// The transaction's `now()`, shared by every timestamp this transaction writes.
    pub locked_at: DateTime<Utc>,
}

/// A driver row held under an exclusive lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedDriver {
    /// Account enabled.
    pub is_active: bool,
    /// Currently assignable.
    pub is_available: bool,
}

impl LockedDriver {
    /// Whether the driver may take a new ride.
    pub const fn is_assignable(&self) -> bool {
        self.is_active && self.is_available
    }
}

/// A rider row read under a share lock for ride creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiderRef {
    /// Contact number, quoted to dispatchers.
    pub phone_number: String,
    /// Account enabled.
    pub is_active: bool,
}

/// Ride and driver statements bound to one open transaction.
pub struct TransitionStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> TransitionStore<'c> {
    /// Bind to the connection of an open transaction.
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Read the rider, holding a share lock so the account cannot be removed
    /// before the ride row references it.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn find_rider(&mut self, rider_id: RiderId) -> Result<Option<RiderRef>, DbError> {
        let row: Option<(String, bool)> = sqlx::query_as(
            "SELECT phone_number, is_active FROM users WHERE id = $1 FOR SHARE",
        )
        .bind(rider_id.into_inner())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(|(phone_number, is_active)| RiderRef {
            phone_number,
            is_active,
        }))
    }

    /// Insert a new `pending` ride stamped with the transaction clock.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert_ride(
        &mut self,
        rider_id: RiderId,
        pickup: &Place,
        drop: Option<&Place>,
    ) -> Result<Ride, DbError> {
        let pickup_coordinates = pickup.coordinates.as_ref();
        let drop_coordinates = drop.and_then(|place| place.coordinates.as_ref());

        let row = sqlx::query_as::<_, RideRow>(concat!(
            "INSERT INTO rides (user_id, pickup_address, pickup_latitude, pickup_longitude, \
             drop_address, drop_latitude, drop_longitude) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING ",
            ride_columns!()
        ))
        .bind(rider_id.into_inner())
        .bind(&pickup.address)
        .bind(pickup_coordinates.map(|c| c.latitude))
        .bind(pickup_coordinates.map(|c| c.longitude))
        .bind(drop.map(|place| place.address.as_str()))
        .bind(drop_coordinates.map(|c| c.latitude))
        .bind(drop_coordinates.map(|c| c.longitude))
        .fetch_one(&mut *self.conn)
        .await?;

        row.into_ride()
    }

    // -----------------------------------------------------------------------
    // Locks
    // -----------------------------------------------------------------------

    /// Lock a ride by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn lock_ride(&mut self, ride_id: RideId) -> Result<Option<LockedRide>, DbError> {
        sqlx::query_as::<_, LockedRideRow>(lock_ride_sql!("WHERE id = $1"))
            .bind(ride_id.into_inner())
            .fetch_optional(&mut *self.conn)
            .await?
            .map(LockedRideRow::into_locked)
            .transpose()
    }

    /// Lock a ride only if it is bound to `driver_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn lock_ride_for_driver(
        &mut self,
        ride_id: RideId,
        driver_id: DriverId,
    ) -> Result<Option<LockedRide>, DbError> {
        sqlx::query_as::<_, LockedRideRow>(lock_ride_sql!("WHERE id = $1 AND driver_id = $2"))
            .bind(ride_id.into_inner())
            .bind(driver_id.into_inner())
            .fetch_optional(&mut *self.conn)
            .await?
            .map(LockedRideRow::into_locked)
            .transpose()
    }

    /// Lock a ride only if it was requested by `rider_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn lock_ride_for_rider(
        &mut self,
        ride_id: RideId,
        rider_id: RiderId,
    ) -> Result<Option<LockedRide>, DbError> {
        sqlx::query_as::<_, LockedRideRow>(lock_ride_sql!("WHERE id = $1 AND user_id = $2"))
            .bind(ride_id.into_inner())
            .bind(rider_id.into_inner())
            .fetch_optional(&mut *self.conn)
            .await?
            .map(LockedRideRow::into_locked)
            .transpose()
    }

    /// Lock a driver row. Call only after the ride row is locked.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn lock_driver(
        &mut self,
        driver_id: DriverId,
    ) -> Result<Option<LockedDriver>, DbError> {
        let row: Option<(bool, bool)> = sqlx::query_as(
            "SELECT is_active, is_available FROM drivers WHERE id = $1 FOR UPDATE",
        )
        .bind(driver_id.into_inner())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(|(is_active, is_available)| LockedDriver {
            is_active,
            is_available,
        }))
    }

    // -----------------------------------------------------------------------
    // Guarded writes
    // -----------------------------------------------------------------------

    /// Bind a driver to a `pending` ride. Returns the number of rows updated
    /// (0 when the ride is no longer `pending`).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn assign_if_pending(
        &mut self,
        ride_id: RideId,
        driver_id: DriverId,
        dispatcher_id: DispatcherId,
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"UPDATE rides
              SET driver_id = $2, dispatcher_id = $3, status = 'assigned',
                  assigned_at = now(), updated_at = now()
              WHERE id = $1 AND status = 'pending'",
        )
        .bind(ride_id.into_inner())
        .bind(driver_id.into_inner())
        .bind(dispatcher_id.into_inner())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Re-read a ride inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn fetch_ride(&mut self, ride_id: RideId) -> Result<Option<Ride>, DbError> {
        sqlx::query_as::<_, RideRow>(concat!(
            "SELECT ",
            ride_columns!(),
            " FROM rides WHERE id = $1"
        ))
        .bind(ride_id.into_inner())
        .fetch_optional(&mut *self.conn)
        .await?
        .map(RideRow::into_ride)
        .transpose()
    }

    /// Move an `assigned` ride bound to `driver_id` to `in_progress`.
    /// Returns `None` when no row matched the guard.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn start_if_assigned(
        &mut self,
        ride_id: RideId,
        driver_id: DriverId,
    ) -> Result<Option<Ride>, DbError> {
        sqlx::query_as::<_, RideRow>(concat!(
            "UPDATE rides SET status = 'in_progress', started_at = now(), updated_at = now() \
             WHERE id = $1 AND driver_id = $2 AND status = 'assigned' RETURNING ",
            ride_columns!()
        ))
        .bind(ride_id.into_inner())
        .bind(driver_id.into_inner())
        .fetch_optional(&mut *self.conn)
        .await?
        .map(RideRow::into_ride)
        .transpose()
    }

    /// Complete an `in_progress` ride, writing `ended_at` and every billing
    /// column in the same statement. Returns `None` when no row matched the
    /// guard.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails, or
    /// [`DbError::Corrupt`] if a billed quantity does not fit the column.
    pub async fn complete_if_in_progress(
        &mut self,
        ride_id: RideId,
        driver_id: DriverId,
        ended_at: DateTime<Utc>,
        billing: &RideBilling,
    ) -> Result<Option<Ride>, DbError> {
        let duration_minutes = to_column(billing.duration_minutes, "duration_minutes")?;
        let additional_hours = to_column(billing.fare.additional_hours, "additional_hours")?;

        sqlx::query_as::<_, RideRow>(concat!(
            "UPDATE rides SET status = 'completed', ended_at = $3, duration_minutes = $4, \
             base_fare = $5, additional_hours = $6, additional_fare = $7, total_fare = $8, \
             updated_at = now() \
             WHERE id = $1 AND driver_id = $2 AND status = 'in_progress' RETURNING ",
            ride_columns!()
        ))
        .bind(ride_id.into_inner())
        .bind(driver_id.into_inner())
        .bind(ended_at)
        .bind(duration_minutes)
        .bind(billing.fare.base_fare)
        .bind(additional_hours)
        .bind(billing.fare.additional_fare)
        .bind(billing.fare.total_fare)
        .fetch_optional(&mut *self.conn)
        .await?
        .map(RideRow::into_ride)
        .transpose()
    }

    /// Cancel a `pending` ride requested by `rider_id`. Returns `None` when
    /// no row matched the guard.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn cancel_if_pending(
        &mut self,
        ride_id: RideId,
        rider_id: RiderId,
    ) -> Result<Option<Ride>, DbError> {
        sqlx::query_as::<_, RideRow>(concat!(
            "UPDATE rides SET status = 'cancelled', updated_at = now() \
             WHERE id = $1 AND user_id = $2 AND status = 'pending' RETURNING ",
            ride_columns!()
        ))
        .bind(ride_id.into_inner())
        .bind(rider_id.into_inner())
        .fetch_optional(&mut *self.conn)
        .await?
        .map(RideRow::into_ride)
        .transpose()
    }

    /// Set a locked driver's availability flag.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn set_driver_availability(
        &mut self,
        driver_id: DriverId,
        is_available: bool,
    ) -> Result<(), DbError> {
        sqlx::query("UPDATE drivers SET is_available = $2 WHERE id = $1")
            .bind(driver_id.into_inner())
            .bind(is_available)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}

fn to_column(value: u32, column: &str) -> Result<i32, DbError> {
    i32::try_from(value)
        .map_err(|e| DbError::Corrupt(format!("{column} out of range: {value} ({e})")))
}

#[derive(Debug, sqlx::FromRow)]
struct LockedRideRow {
    status: String,
    started_at: Option<DateTime<Utc>>,
    locked_at: DateTime<Utc>,
}

impl LockedRideRow {
    fn into_locked(self) -> Result<LockedRide, DbError> {
        Ok(LockedRide {
            status: parse_status(&self.status)?,
            started_at: self.started_at,
            locked_at: self.locked_at,
        })
    }
}
