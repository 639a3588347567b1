//! The ride transition engine.
//!
//! Each operation runs as one `SERIALIZABLE` transaction:
//!
//! 1. Lock the ride row (`FOR UPDATE`), scoped to the caller where the
//!    caller must own the ride.
//! 2. Check the locked status against the [`Transition`] edge.
//! 3. Lock or update the driver row (always after the ride row).
//! 4. Apply a status write guarded by the expected status.
//! 5. Commit, or roll back on any error.
//!
//! Serialization failures and deadlocks re-run the whole transaction under
//! the engine's [`RetryPolicy`]. Notifications are enqueued only after a
//! successful commit.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};

use ridehail_db::{PostgresPool, TransitionStore, finish_transaction};
use ridehail_fare::{FareSchedule, elapsed_minutes};
use ridehail_types::{
    Coordinates, DispatcherId, DriverId, Place, Ride, RideBilling, RideId, RideStatus, RiderId,
};
use rust_decimal::Decimal;

use crate::error::{Entity, TransitionError};
use crate::machine::Transition;
use crate::notify::{self, Notifier};
use crate::retry::RetryPolicy;

/// Applies ride transitions against the ledger store.
#[derive(Clone)]
pub struct RideEngine {
    pool: PostgresPool,
    fares: FareSchedule,
    retry: RetryPolicy,
    notifier: Notifier,
}

impl RideEngine {
    /// Create an engine over `pool`.
    pub const fn new(
        pool: PostgresPool,
        fares: FareSchedule,
        retry: RetryPolicy,
        notifier: Notifier,
    ) -> Self {
        Self {
            pool,
            fares,
            retry,
            notifier,
        }
    }

    /// The underlying pool, for read-side queries.
    pub const fn pool(&self) -> &PostgresPool {
        &self.pool
    }

    /// Run one transaction attempt per call under the retry policy.
    ///
    /// A retried attempt that finds the ride in an unexpected status lost a
    /// race to the transaction that caused the retry, so it is reported as
    /// [`TransitionError::Conflict`].
    async fn transact<T, F, Fut>(&self, mut attempt: F) -> Result<T, TransitionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransitionError>>,
    {
        let attempts = AtomicU32::new(0);
        let result = self
            .retry
            .run(
                || {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    attempt()
                },
                TransitionError::is_retryable,
            )
            .await;

        match result {
            Err(TransitionError::InvalidTransition { ride_id, from, .. })
                if attempts.load(Ordering::Relaxed) > 1 =>
            {
                Err(TransitionError::conflict(
                    ride_id,
                    format!("ride became {from} in a concurrent transition"),
                ))
            }
            other => other,
        }
    }

    // -----------------------------------------------------------------------
    // RequestRide
    // -----------------------------------------------------------------------

    /// Create a `pending` ride for an active rider.
    ///
    /// On commit, all dispatchers are notified.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::Validation`] if `pickup` is absent or malformed,
    ///   or `destination` is malformed.
    /// - [`TransitionError::NotFound`] if the rider does not exist or is
    ///   inactive.
    pub async fn request_ride(
        &self,
        rider_id: RiderId,
        pickup: Option<Place>,
        destination: Option<Place>,
    ) -> Result<Ride, TransitionError> {
        let pickup = validate_places(pickup, destination.as_ref())?;

        let (ride, rider_phone) = self
            .transact(|| self.request_once(rider_id, &pickup, destination.as_ref()))
            .await?;

        tracing::info!(ride_id = %ride.id, rider_id = %rider_id, "Ride requested");
        self.notifier
            .notify(notify::new_ride_request(&ride, &rider_phone));
        Ok(ride)
    }

    async fn request_once(
        &self,
        rider_id: RiderId,
        pickup: &Place,
        destination: Option<&Place>,
    ) -> Result<(Ride, String), TransitionError> {
        let mut tx = self.pool.begin_serializable().await?;
        let result = Self::request_locked(
            &mut TransitionStore::new(&mut *tx),
            rider_id,
            pickup,
            destination,
        )
        .await;
        finish_transaction(tx, result).await
    }

    async fn request_locked(
        store: &mut TransitionStore<'_>,
        rider_id: RiderId,
        pickup: &Place,
        destination: Option<&Place>,
    ) -> Result<(Ride, String), TransitionError> {
        let rider = store
            .find_rider(rider_id)
            .await?
            .filter(|rider| rider.is_active)
            .ok_or_else(|| TransitionError::not_found(Entity::Rider, rider_id))?;
        let ride = store.insert_ride(rider_id, pickup, destination).await?;
        Ok((ride, rider.phone_number))
    }

    // -----------------------------------------------------------------------
    // AssignDriver
    // -----------------------------------------------------------------------

    /// Bind `driver_id` to a `pending` ride on behalf of `dispatcher_id`.
    ///
    /// The driver becomes unavailable in the same transaction. On commit,
    /// the driver and the rider are notified.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::NotFound`] if the ride, driver or dispatcher
    ///   does not exist.
    /// - [`TransitionError::InvalidTransition`] if the ride is not `pending`.
    /// - [`TransitionError::Conflict`] if the driver is inactive, unavailable
    ///   or already bound to an active ride, or if another assignment won.
    pub async fn assign_driver(
        &self,
        dispatcher_id: DispatcherId,
        ride_id: RideId,
        driver_id: DriverId,
    ) -> Result<Ride, TransitionError> {
        let ride = self
            .transact(|| self.assign_once(dispatcher_id, ride_id, driver_id))
            .await?;

        tracing::info!(
            ride_id = %ride_id,
            driver_id = %driver_id,
            dispatcher_id = %dispatcher_id,
            "Driver assigned"
        );
        self.notifier.notify_all(notify::ride_assigned(&ride));
        Ok(ride)
    }

    async fn assign_once(
        &self,
        dispatcher_id: DispatcherId,
        ride_id: RideId,
        driver_id: DriverId,
    ) -> Result<Ride, TransitionError> {
        let mut tx = self.pool.begin_serializable().await?;
        let result = Self::assign_locked(
            &mut TransitionStore::new(&mut *tx),
            dispatcher_id,
            ride_id,
            driver_id,
        )
        .await;
        finish_transaction(tx, result).await
    }

    async fn assign_locked(
        store: &mut TransitionStore<'_>,
        dispatcher_id: DispatcherId,
        ride_id: RideId,
        driver_id: DriverId,
    ) -> Result<Ride, TransitionError> {
        let ride = store
            .lock_ride(ride_id)
            .await?
            .ok_or_else(|| TransitionError::not_found(Entity::Ride, ride_id))?;
        Transition::Assign.check(ride_id, ride.status)?;

        let driver = store
            .lock_driver(driver_id)
            .await?
            .ok_or_else(|| TransitionError::not_found(Entity::Driver, driver_id))?;
        if !driver.is_assignable() {
            let reason = if driver.is_active {
                "is not available"
            } else {
                "is inactive"
            };
            return Err(TransitionError::conflict(
                ride_id,
                format!("driver {driver_id} {reason}"),
            ));
        }

        let updated = match store
            .assign_if_pending(ride_id, driver_id, dispatcher_id)
            .await
        {
            Ok(updated) => updated,
            Err(err) if err.is_unique_violation() => {
                return Err(TransitionError::conflict(
                    ride_id,
                    format!("driver {driver_id} already holds an active ride"),
                ));
            }
            Err(err) if err.is_foreign_key_violation() => {
                return Err(TransitionError::not_found(
                    Entity::Dispatcher,
                    dispatcher_id,
                ));
            }
            Err(err) => return Err(err.into()),
        };

        // Confirm the guarded write landed on this assignment.
        let assigned = store
            .fetch_ride(ride_id)
            .await?
            .ok_or_else(|| TransitionError::not_found(Entity::Ride, ride_id))?;
        if updated == 0
            || assigned.status != RideStatus::Assigned
            || assigned.driver_id != Some(driver_id)
        {
            return Err(TransitionError::conflict(
                ride_id,
                "ride was assigned by another dispatcher concurrently",
            ));
        }

        store.set_driver_availability(driver_id, false).await?;
        Ok(assigned)
    }

    // -----------------------------------------------------------------------
    // StartRide
    // -----------------------------------------------------------------------

    /// Move the driver's `assigned` ride to `in_progress`.
    ///
    /// On commit, the rider is notified.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::NotFound`] if the ride does not exist or is not
    ///   bound to this driver.
    /// - [`TransitionError::InvalidTransition`] if the ride is not `assigned`.
    /// - [`TransitionError::Conflict`] if the guarded write matched no row.
    pub async fn start_ride(
        &self,
        driver_id: DriverId,
        ride_id: RideId,
    ) -> Result<Ride, TransitionError> {
        let ride = self
            .transact(|| self.start_once(driver_id, ride_id))
            .await?;

        tracing::info!(ride_id = %ride_id, driver_id = %driver_id, "Ride started");
        self.notifier.notify(notify::ride_started(&ride));
        Ok(ride)
    }

    async fn start_once(
        &self,
        driver_id: DriverId,
        ride_id: RideId,
    ) -> Result<Ride, TransitionError> {
        let mut tx = self.pool.begin_serializable().await?;
        let result =
            Self::start_locked(&mut TransitionStore::new(&mut *tx), driver_id, ride_id).await;
        finish_transaction(tx, result).await
    }

    async fn start_locked(
        store: &mut TransitionStore<'_>,
        driver_id: DriverId,
        ride_id: RideId,
    ) -> Result<Ride, TransitionError> {
        let ride = store
            .lock_ride_for_driver(ride_id, driver_id)
            .await?
            .ok_or_else(|| TransitionError::not_found(Entity::Ride, ride_id))?;
        Transition::Start.check(ride_id, ride.status)?;

        let started = store
            .start_if_assigned(ride_id, driver_id)
            .await?
            .ok_or_else(|| TransitionError::conflict(ride_id, "ride status changed concurrently"))?;

        store.set_driver_availability(driver_id, false).await?;
        Ok(started)
    }

    // -----------------------------------------------------------------------
    // EndRide
    // -----------------------------------------------------------------------

    /// Complete the driver's `in_progress` ride and bill it.
    ///
    /// The elapsed time runs from `started_at` to the transaction clock,
    /// which is also written as `ended_at`. The driver becomes available in
    /// the same transaction. On commit, the rider and the assigning
    /// dispatcher are notified.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::NotFound`] if the ride does not exist or is not
    ///   bound to this driver.
    /// - [`TransitionError::InvalidTransition`] if the ride is not
    ///   `in_progress` (including an already completed ride).
    /// - [`TransitionError::DataIntegrity`] if the ride has no start time.
    /// - [`TransitionError::Conflict`] if the guarded write matched no row.
    pub async fn end_ride(
        &self,
        driver_id: DriverId,
        ride_id: RideId,
    ) -> Result<Ride, TransitionError> {
        let (ride, billing) = self
            .transact(|| self.end_once(driver_id, ride_id))
            .await?;

        tracing::info!(
            ride_id = %ride_id,
            driver_id = %driver_id,
            duration_minutes = billing.duration_minutes,
            total_fare = %billing.fare.total_fare,
            "Ride completed"
        );
        self.notifier
            .notify_all(notify::ride_completed(&ride, &billing));
        Ok(ride)
    }

    async fn end_once(
        &self,
        driver_id: DriverId,
        ride_id: RideId,
    ) -> Result<(Ride, RideBilling), TransitionError> {
        let mut tx = self.pool.begin_serializable().await?;
        let result = self
            .end_locked(&mut TransitionStore::new(&mut *tx), driver_id, ride_id)
            .await;
        finish_transaction(tx, result).await
    }

    async fn end_locked(
        &self,
        store: &mut TransitionStore<'_>,
        driver_id: DriverId,
        ride_id: RideId,
    ) -> Result<(Ride, RideBilling), TransitionError> {
        let ride = store
            .lock_ride_for_driver(ride_id, driver_id)
            .await?
            .ok_or_else(|| TransitionError::not_found(Entity::Ride, ride_id))?;
        Transition::Complete.check(ride_id, ride.status)?;

        let started_at = ride
            .started_at
            .ok_or_else(|| TransitionError::DataIntegrity {
                ride_id,
                reason: "in_progress ride has no start time".to_owned(),
            })?;
        let billing = self.bill(elapsed_minutes(started_at, ride.locked_at));

        let completed = store
            .complete_if_in_progress(ride_id, driver_id, ride.locked_at, &billing)
            .await?
            .ok_or_else(|| TransitionError::conflict(ride_id, "ride status changed concurrently"))?;

        store.set_driver_availability(driver_id, true).await?;
        // Quote what was stored; fare columns hold two decimal places.
        let stored = completed.billing.unwrap_or(billing);
        Ok((completed, stored))
    }

    /// Billing for a ride lasting `duration_minutes` under this engine's rate card.
    pub fn bill(&self, duration_minutes: u32) -> RideBilling {
        RideBilling {
            duration_minutes,
            fare: self.fares.calculate(duration_minutes),
        }
    }

    // -----------------------------------------------------------------------
    // CancelRide
    // -----------------------------------------------------------------------

    /// Cancel the rider's own `pending` ride.
    ///
    /// No driver is bound to a pending ride, so no availability changes.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::NotFound`] if the ride does not exist or belongs
    ///   to another rider.
    /// - [`TransitionError::InvalidTransition`] if the ride is not `pending`.
    /// - [`TransitionError::Conflict`] if the guarded write matched no row.
    pub async fn cancel_ride(
        &self,
        rider_id: RiderId,
        ride_id: RideId,
    ) -> Result<Ride, TransitionError> {
        let ride = self
            .transact(|| self.cancel_once(rider_id, ride_id))
            .await?;

        tracing::info!(ride_id = %ride_id, rider_id = %rider_id, "Ride cancelled");
        Ok(ride)
    }

    async fn cancel_once(
        &self,
        rider_id: RiderId,
        ride_id: RideId,
    ) -> Result<Ride, TransitionError> {
        let mut tx = self.pool.begin_serializable().await?;
        let result =
            Self::cancel_locked(&mut TransitionStore::new(&mut *tx), rider_id, ride_id).await;
        finish_transaction(tx, result).await
    }

    async fn cancel_locked(
        store: &mut TransitionStore<'_>,
        rider_id: RiderId,
        ride_id: RideId,
    ) -> Result<Ride, TransitionError> {
        let ride = store
            .lock_ride_for_rider(ride_id, rider_id)
            .await?
            .ok_or_else(|| TransitionError::not_found(Entity::Ride, ride_id))?;
        Transition::Cancel.check(ride_id, ride.status)?;

        store
            .cancel_if_pending(ride_id, rider_id)
            .await?
            .ok_or_else(|| TransitionError::conflict(ride_id, "ride status changed concurrently"))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Largest absolute latitude.
const MAX_LATITUDE: Decimal = Decimal::from_parts(90, 0, 0, false, 0);

/// Largest absolute longitude.
const MAX_LONGITUDE: Decimal = Decimal::from_parts(180, 0, 0, false, 0);

/// Check the pickup is present and both places are well formed.
fn validate_places(
    pickup: Option<Place>,
    destination: Option<&Place>,
) -> Result<Place, TransitionError> {
    let pickup = pickup
        .ok_or_else(|| TransitionError::Validation("pickup location is required".to_owned()))?;
    validate_place("pickup", &pickup)?;
    if let Some(destination) = destination {
        validate_place("drop", destination)?;
    }
    Ok(pickup)
}

fn validate_place(field: &str, place: &Place) -> Result<(), TransitionError> {
    if place.address.trim().is_empty() {
        return Err(TransitionError::Validation(format!(
            "{field} address must not be blank"
        )));
    }
    if let Some(Coordinates {
        latitude,
        longitude,
    }) = place.coordinates
    {
        if latitude.abs() > MAX_LATITUDE {
            return Err(TransitionError::Validation(format!(
                "{field} latitude {latitude} is out of range"
            )));
        }
        if longitude.abs() > MAX_LONGITUDE {
            return Err(TransitionError::Validation(format!(
                "{field} longitude {longitude} is out of range"
            )));
        }
    }
    Ok(())
}
