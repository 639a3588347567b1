//! Read-side queries over the `rides` table.
//!
//! Everything here is a single lock-free statement against the pool. None of
//! these reads may be used to decide a transition; transitions read their
//! rows through [`TransitionStore`](crate::TransitionStore) under a row lock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use ridehail_types::{
    Coordinates, DispatcherId, DriverId, DriverPerformance, EarningsSummary, Fare, Page,
    PendingRide, Place, Ride, RideBilling, RideId, RideStats, RideStatus, RiderId,
};

use crate::error::DbError;

/// The `rides` column list in [`RideRow`] order.
macro_rules! ride_columns {
    () => {
        "id, user_id, driver_id, dispatcher_id, \
         pickup_address, pickup_latitude, pickup_longitude, \
         drop_address, drop_latitude, drop_longitude, \
         status::TEXT AS status, requested_at, assigned_at, started_at, ended_at, \
         duration_minutes, base_fare, additional_hours, additional_fare, total_fare"
    };
}
pub(crate) use ride_columns;

/// Builds a `SELECT <ride columns> FROM rides <tail>` statement at compile time.
macro_rules! select_rides {
    ($($tail:literal)*) => {
        concat!("SELECT ", ride_columns!(), " FROM rides ", $($tail),*)
    };
}

/// Aggregates [`RideStats`] over the rides whose `$owner` column is `$1`.
macro_rules! ride_stats_sql {
    ($owner:literal) => {
        concat!(
            "SELECT COUNT(*), \
             COUNT(*) FILTER (WHERE status = 'completed'), \
             COALESCE(SUM(total_fare) FILTER (WHERE status = 'completed'), 0), \
             COALESCE(ROUND(AVG(total_fare) FILTER (WHERE status = 'completed'), 2), 0) \
             FROM rides WHERE ",
            $owner,
            " = $1"
        )
    };
}

/// Filters for the dispatcher's ride listing.
#[derive(Debug, Clone, Default)]
pub struct RideFilter {
    /// Only rides in this status.
    pub status: Option<RideStatus>,
    /// Only rides requested at or after this instant.
    pub requested_from: Option<DateTime<Utc>>,
    /// Only rides requested at or before this instant.
    pub requested_to: Option<DateTime<Utc>>,
}

/// Filters for the driver performance report.
///
/// The window applies to `ended_at`. Without a window every ride ever bound
/// to the driver is counted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceFilter {
    /// Only this driver.
    pub driver_id: Option<DriverId>,
    /// Only rides ended at or after this instant.
    pub ended_from: Option<DateTime<Utc>>,
    /// Only rides ended at or before this instant.
    pub ended_to: Option<DateTime<Utc>>,
}

/// Page bounds for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum rows to return.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
}

impl PageRequest {
    /// Largest page a caller may request.
    pub const MAX_LIMIT: i64 = 100;

    /// Clamp caller-supplied bounds: `limit` to `1..=MAX_LIMIT` (defaulting
    /// to `default_limit`), `offset` to non-negative.
    pub fn clamped(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> Self {
        Self {
            limit: limit.unwrap_or(default_limit).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }

    fn page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Read operations on the `rides` table.
pub struct RideStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RideStore<'a> {
    /// Create a new ride store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a ride by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, ride_id: RideId) -> Result<Option<Ride>, DbError> {
        sqlx::query_as::<_, RideRow>(select_rides!("WHERE id = $1"))
            .bind(ride_id.into_inner())
            .fetch_optional(self.pool)
            .await?
            .map(RideRow::into_ride)
            .transpose()
    }

    /// Fetch a ride by id, only if it belongs to `rider_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get_for_rider(
        &self,
        ride_id: RideId,
        rider_id: RiderId,
    ) -> Result<Option<Ride>, DbError> {
        sqlx::query_as::<_, RideRow>(select_rides!("WHERE id = $1 AND user_id = $2"))
            .bind(ride_id.into_inner())
            .bind(rider_id.into_inner())
            .fetch_optional(self.pool)
            .await?
            .map(RideRow::into_ride)
            .transpose()
    }

    /// Pending rides, oldest first, with the requesting rider's phone number.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<PendingRide>, DbError> {
        let rows = sqlx::query_as::<_, PendingRideRow>(
            r"SELECT r.id, r.pickup_address, r.drop_address, r.requested_at,
                     u.phone_number AS rider_phone
              FROM rides r
              JOIN users u ON u.id = r.user_id
              WHERE r.status = 'pending'
              ORDER BY r.requested_at ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(PendingRideRow::into_pending).collect())
    }

    /// Rides with a driver bound (`assigned` or `in_progress`), newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_live(&self) -> Result<Vec<Ride>, DbError> {
        let rows = sqlx::query_as::<_, RideRow>(select_rides!(
            "WHERE status IN ('assigned', 'in_progress') ORDER BY requested_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(RideRow::into_ride).collect()
    }

    /// All rides matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list(&self, filter: &RideFilter, page: PageRequest) -> Result<Page<Ride>, DbError> {
        let status = filter.status.map(RideStatus::as_db_str);

        let rows = sqlx::query_as::<_, RideRow>(select_rides!(
            "WHERE ($1::TEXT IS NULL OR status = $1::ride_status) "
            "AND ($2::TIMESTAMPTZ IS NULL OR requested_at >= $2) "
            "AND ($3::TIMESTAMPTZ IS NULL OR requested_at <= $3) "
            "ORDER BY requested_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(status)
        .bind(filter.requested_from)
        .bind(filter.requested_to)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM rides
              WHERE ($1::TEXT IS NULL OR status = $1::ride_status)
                AND ($2::TIMESTAMPTZ IS NULL OR requested_at >= $2)
                AND ($3::TIMESTAMPTZ IS NULL OR requested_at <= $3)",
        )
        .bind(status)
        .bind(filter.requested_from)
        .bind(filter.requested_to)
        .fetch_one(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(RideRow::into_ride)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(page.page(items, total))
    }

    /// The driver's `assigned` and `in_progress` rides, most recently assigned first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_active_for_driver(&self, driver_id: DriverId) -> Result<Vec<Ride>, DbError> {
        let rows = sqlx::query_as::<_, RideRow>(select_rides!(
            "WHERE driver_id = $1 AND status IN ('assigned', 'in_progress') "
            "ORDER BY assigned_at DESC"
        ))
        .bind(driver_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(RideRow::into_ride).collect()
    }

    /// The driver's rides, most recently ended first, optionally restricted
    /// to rides ended inside `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn history_for_driver(
        &self,
        driver_id: DriverId,
        ended_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
        page: PageRequest,
    ) -> Result<Page<Ride>, DbError> {
        let (from, to) = ended_between.unzip();

        let rows = sqlx::query_as::<_, RideRow>(select_rides!(
            "WHERE driver_id = $1 "
            "AND ($2::TIMESTAMPTZ IS NULL OR ended_at >= $2) "
            "AND ($3::TIMESTAMPTZ IS NULL OR ended_at < $3) "
            "ORDER BY ended_at DESC NULLS LAST, requested_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(driver_id.into_inner())
        .bind(from)
        .bind(to)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM rides
              WHERE driver_id = $1
                AND ($2::TIMESTAMPTZ IS NULL OR ended_at >= $2)
                AND ($3::TIMESTAMPTZ IS NULL OR ended_at < $3)",
        )
        .bind(driver_id.into_inner())
        .bind(from)
        .bind(to)
        .fetch_one(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(RideRow::into_ride)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(page.page(items, total))
    }

    /// The rider's rides, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn history_for_rider(
        &self,
        rider_id: RiderId,
        page: PageRequest,
    ) -> Result<Page<Ride>, DbError> {
        let rows = sqlx::query_as::<_, RideRow>(select_rides!(
            "WHERE user_id = $1 ORDER BY requested_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(rider_id.into_inner())
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rides WHERE user_id = $1")
            .bind(rider_id.into_inner())
            .fetch_one(self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(RideRow::into_ride)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(page.page(items, total))
    }

    /// Earnings over the driver's rides completed inside `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn driver_earnings(
        &self,
        driver_id: DriverId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<EarningsSummary, DbError> {
        let (total_rides, total_earnings, total_minutes): (i64, Decimal, i64) = sqlx::query_as(
            r"SELECT COUNT(*),
                     COALESCE(SUM(total_fare), 0),
                     COALESCE(SUM(duration_minutes), 0)::BIGINT
              FROM rides
              WHERE driver_id = $1
                AND status = 'completed'
                AND ended_at >= $2
                AND ended_at < $3",
        )
        .bind(driver_id.into_inner())
        .bind(start)
        .bind(end)
        .fetch_one(self.pool)
        .await?;

        Ok(EarningsSummary {
            window_start: start,
            window_end: end,
            total_rides,
            total_earnings,
            total_minutes,
            total_hours: minutes_to_hours(total_minutes),
        })
    }

    /// Ride totals for a rider.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn stats_for_rider(&self, rider_id: RiderId) -> Result<RideStats, DbError> {
        self.stats(ride_stats_sql!("user_id"), rider_id.into_inner())
            .await
    }

    /// Ride totals for a driver.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn stats_for_driver(&self, driver_id: DriverId) -> Result<RideStats, DbError> {
        self.stats(ride_stats_sql!("driver_id"), driver_id.into_inner())
            .await
    }

    async fn stats(&self, sql: &'static str, owner: Uuid) -> Result<RideStats, DbError> {
        let (total_rides, completed_rides, total_fare, average_fare): (i64, i64, Decimal, Decimal) =
            sqlx::query_as(sql).bind(owner).fetch_one(self.pool).await?;

        Ok(RideStats {
            total_rides,
            completed_rides,
            total_fare,
            average_fare,
        })
    }

    /// Per-driver ride counts and earnings, busiest first.
    ///
    /// Drivers with no ride in the window are listed with zero totals.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn driver_performance(
        &self,
        filter: &PerformanceFilter,
    ) -> Result<Vec<DriverPerformance>, DbError> {
        let rows = sqlx::query_as::<_, PerformanceRow>(
            r"SELECT d.id, d.name, d.phone_number,
                     COUNT(r.id) AS total_rides,
                     COUNT(r.id) FILTER (WHERE r.status = 'completed') AS completed_rides,
                     COALESCE(SUM(r.total_fare), 0) AS total_earnings,
                     COALESCE(SUM(r.duration_minutes), 0)::BIGINT AS total_minutes,
                     ROUND(AVG(r.total_fare), 2) AS average_fare
              FROM drivers d
              LEFT JOIN rides r
                ON r.driver_id = d.id
               AND ($2::TIMESTAMPTZ IS NULL OR r.ended_at >= $2)
               AND ($3::TIMESTAMPTZ IS NULL OR r.ended_at <= $3)
              WHERE ($1::UUID IS NULL OR d.id = $1)
              GROUP BY d.id, d.name, d.phone_number
              ORDER BY total_rides DESC, d.name",
        )
        .bind(filter.driver_id.map(DriverId::into_inner))
        .bind(filter.ended_from)
        .bind(filter.ended_to)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(DriverPerformance::from).collect())
    }
}

/// Convert minutes to hours, rounded to two decimal places.
fn minutes_to_hours(minutes: i64) -> Decimal {
    Decimal::from(minutes)
        .checked_div(Decimal::from(60))
        .unwrap_or_default()
        .round_dp(2)
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `rides` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RideRow {
    /// Ride UUID.
    pub id: Uuid,
    /// Requesting rider.
    pub user_id: Uuid,
    /// Assigned driver.
    pub driver_id: Option<Uuid>,
    /// Assigning dispatcher.
    pub dispatcher_id: Option<Uuid>,
    /// Pickup address.
    pub pickup_address: String,
    /// Pickup latitude.
    pub pickup_latitude: Option<Decimal>,
    /// Pickup longitude.
    pub pickup_longitude: Option<Decimal>,
    /// Drop address.
    pub drop_address: Option<String>,
    /// Drop latitude.
    pub drop_latitude: Option<Decimal>,
    /// Drop longitude.
    pub drop_longitude: Option<Decimal>,
    /// Status as a string (cast from the `PostgreSQL` enum).
    pub status: String,
    /// Request time.
    pub requested_at: DateTime<Utc>,
    /// Assignment time.
    pub assigned_at: Option<DateTime<Utc>>,
    /// Start time.
    pub started_at: Option<DateTime<Utc>>,
    /// End time.
    pub ended_at: Option<DateTime<Utc>>,
    /// Billed duration.
    pub duration_minutes: Option<i32>,
    /// Base fare.
    pub base_fare: Option<Decimal>,
    /// Hours billed beyond the base.
    pub additional_hours: Option<i32>,
    /// Fare for the additional hours.
    pub additional_fare: Option<Decimal>,
    /// Total fare.
    pub total_fare: Option<Decimal>,
}

impl RideRow {
    /// Convert into the domain [`Ride`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Corrupt`] if the status label is unknown or the
    /// billing columns are only partially populated.
    pub fn into_ride(self) -> Result<Ride, DbError> {
        let status = parse_status(&self.status)?;
        let billing = self.billing()?;

        Ok(Ride {
            id: RideId(self.id),
            rider_id: RiderId(self.user_id),
            driver_id: self.driver_id.map(DriverId),
            dispatcher_id: self.dispatcher_id.map(DispatcherId),
            pickup: Place {
                address: self.pickup_address,
                coordinates: coordinates(self.pickup_latitude, self.pickup_longitude),
            },
            drop: self.drop_address.map(|address| Place {
                address,
                coordinates: coordinates(self.drop_latitude, self.drop_longitude),
            }),
            status,
            requested_at: self.requested_at,
            assigned_at: self.assigned_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
            billing,
        })
    }

    fn billing(&self) -> Result<Option<RideBilling>, DbError> {
        match (
            self.duration_minutes,
            self.base_fare,
            self.additional_hours,
            self.additional_fare,
            self.total_fare,
        ) {
            (None, None, None, None, None) => Ok(None),
            (Some(minutes), Some(base_fare), Some(hours), Some(additional_fare), Some(total_fare)) => {
                Ok(Some(RideBilling {
                    duration_minutes: non_negative(minutes, "duration_minutes")?,
                    fare: Fare {
                        base_fare,
                        additional_hours: non_negative(hours, "additional_hours")?,
                        additional_fare,
                        total_fare,
                    },
                }))
            }
            _ => Err(DbError::Corrupt(format!(
                "ride {} has partially populated billing columns",
                self.id
            ))),
        }
    }
}

/// Parse a `ride_status` label read back from the database.
pub(crate) fn parse_status(label: &str) -> Result<RideStatus, DbError> {
    RideStatus::from_db_str(label)
        .ok_or_else(|| DbError::Corrupt(format!("unknown ride status '{label}'")))
}

fn non_negative(value: i32, column: &str) -> Result<u32, DbError> {
    u32::try_from(value)
        .map_err(|e| DbError::Corrupt(format!("negative {column}: {value} ({e})")))
}

fn coordinates(latitude: Option<Decimal>, longitude: Option<Decimal>) -> Option<Coordinates> {
    latitude
        .zip(longitude)
        .map(|(latitude, longitude)| Coordinates {
            latitude,
            longitude,
        })
}

/// A pending ride joined with its rider's phone number.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PendingRideRow {
    id: Uuid,
    pickup_address: String,
    drop_address: Option<String>,
    requested_at: DateTime<Utc>,
    rider_phone: String,
}

impl PendingRideRow {
    fn into_pending(self) -> PendingRide {
        PendingRide {
            id: RideId(self.id),
            pickup_address: self.pickup_address,
            drop_address: self.drop_address,
            requested_at: self.requested_at,
            rider_phone: self.rider_phone,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PerformanceRow {
    id: Uuid,
    name: String,
    phone_number: String,
    total_rides: i64,
    completed_rides: i64,
    total_earnings: Decimal,
    total_minutes: i64,
    average_fare: Option<Decimal>,
}

impl From<PerformanceRow> for DriverPerformance {
    fn from(row: PerformanceRow) -> Self {
        Self {
            driver_id: DriverId(row.id),
            name: row.name,
            phone_number: row.phone_number,
            total_rides: row.total_rides,
            completed_rides: row.completed_rides,
            total_earnings: row.total_earnings,
            total_minutes: row.total_minutes,
            average_fare: row.average_fare,
        }
    }
}
