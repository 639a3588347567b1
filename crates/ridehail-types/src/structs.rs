//! Core entity structs for the ride lifecycle.
//!
//! [`Ride`] is the central entity. [`Driver`], [`Rider`] and [`Dispatcher`]
//! are the three actor records. [`Fare`] is the billing breakdown written
//! once at ride completion, and [`Notification`] / [`NewNotification`] are
//! the best-effort side-channel records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{NotificationType, RideStatus};
use crate::ids::{DispatcherId, DriverId, NotificationId, RideId, RiderId};

// ---------------------------------------------------------------------------
// Places
// ---------------------------------------------------------------------------

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinates {
    /// Latitude, -90 to 90.
    #[ts(as = "String")]
    pub latitude: Decimal,
    /// Longitude, -180 to 180.
    #[ts(as = "String")]
    pub longitude: Decimal,
}

/// A pickup or drop location descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Place {
    /// Free-form street address.
    pub address: String,
    /// Optional coordinates supplied by the rider's client.
    pub coordinates: Option<Coordinates>,
}

impl Place {
    /// A place known only by its address.
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            coordinates: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Billing
// ---------------------------------------------------------------------------

/// Billing breakdown for a completed ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Fare {
    /// Flat fare covering the base hours.
    #[ts(as = "String")]
    pub base_fare: Decimal,
    /// Whole hours billed beyond the base hours.
    pub additional_hours: u32,
    /// `additional_hours` times the hourly rate.
    #[ts(as = "String")]
    pub additional_fare: Decimal,
    /// `base_fare + additional_fare`.
    #[ts(as = "String")]
    pub total_fare: Decimal,
}

/// Billing fields persisted on a completed ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RideBilling {
    /// Elapsed minutes between start and end, rounded up.
    pub duration_minutes: u32,
    /// The fare computed from `duration_minutes`.
    pub fare: Fare,
}

// ---------------------------------------------------------------------------
// Ride
// ---------------------------------------------------------------------------

/// A single transportation request from creation to a terminal outcome.
///
/// Rides are never deleted. `billing` is `None` until `ended_at` is set and is
/// written exactly once, together with the `completed` status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Ride {
    /// Ride identifier.
    pub id: RideId,
    /// The rider who requested the ride.
    pub rider_id: RiderId,
    /// The assigned driver, once a dispatcher has assigned one.
    pub driver_id: Option<DriverId>,
    /// The dispatcher who performed the assignment.
    pub dispatcher_id: Option<DispatcherId>,
    /// Where the rider is picked up.
    pub pickup: Place,
    /// Where the rider is dropped, if known up front.
    pub drop: Option<Place>,
    /// Current lifecycle status.
    pub status: RideStatus,
    /// When the ride was requested.
    pub requested_at: DateTime<Utc>,
    /// When a driver was assigned.
    pub assigned_at: Option<DateTime<Utc>>,
    /// When the driver started the ride.
    pub started_at: Option<DateTime<Utc>>,
    /// When the driver ended the ride.
    pub ended_at: Option<DateTime<Utc>>,
    /// Billing fields, present only on completed rides.
    pub billing: Option<RideBilling>,
}

/// A pending ride as shown in the dispatcher queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PendingRide {
    /// Ride identifier.
    pub id: RideId,
    /// Pickup address.
    pub pickup_address: String,
    /// Drop address, if given.
    pub drop_address: Option<String>,
    /// When the ride was requested.
    pub requested_at: DateTime<Utc>,
    /// Phone number of the requesting rider.
    pub rider_phone: String,
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// A driver account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Driver {
    /// Driver identifier.
    pub id: DriverId,
    /// Display name.
    pub name: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Driving license number.
    pub license_number: Option<String>,
    /// Vehicle registration number.
    pub vehicle_number: Option<String>,
    /// Account enabled.
    pub is_active: bool,
    /// Currently assignable (not bound to an active ride).
    pub is_available: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A rider account (stored in the `users` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Rider {
    /// Rider identifier.
    pub id: RiderId,
    /// Contact phone number.
    pub phone_number: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Account enabled.
    pub is_active: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A dispatcher account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Dispatcher {
    /// Dispatcher identifier.
    pub id: DispatcherId,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A persisted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Ride the notification is about.
    pub ride_id: Option<RideId>,
    /// Addressed rider.
    pub rider_id: Option<RiderId>,
    /// Addressed driver.
    pub driver_id: Option<DriverId>,
    /// Addressed dispatcher.
    pub dispatcher_id: Option<DispatcherId>,
    /// Category tag.
    pub notification_type: NotificationType,
    /// Human-readable text.
    pub message: String,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

/// A notification waiting to be recorded by a sink.
///
/// A notification with no rider, driver or dispatcher is addressed to all
/// dispatchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
    /// Ride the notification is about.
    pub ride_id: Option<RideId>,
    /// Addressed rider.
    pub rider_id: Option<RiderId>,
    /// Addressed driver.
    pub driver_id: Option<DriverId>,
    /// Addressed dispatcher.
    pub dispatcher_id: Option<DispatcherId>,
    /// Category tag.
    pub notification_type: NotificationType,
    /// Human-readable text.
    pub message: String,
}

impl NewNotification {
    /// A notification about `ride_id` with no recipient set yet.
    pub fn about(ride_id: RideId, notification_type: NotificationType, message: String) -> Self {
        Self {
            ride_id: Some(ride_id),
            rider_id: None,
            driver_id: None,
            dispatcher_id: None,
            notification_type,
            message,
        }
    }

    /// Address the notification to a rider.
    #[must_use]
    pub const fn to_rider(mut self, rider_id: RiderId) -> Self {
        self.rider_id = Some(rider_id);
        self
    }

    /// Address the notification to a driver.
    #[must_use]
    pub const fn to_driver(mut self, driver_id: DriverId) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    /// Address the notification to a dispatcher.
    #[must_use]
    pub const fn to_dispatcher(mut self, dispatcher_id: DispatcherId) -> Self {
        self.dispatcher_id = Some(dispatcher_id);
        self
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Aggregate earnings over completed rides in a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EarningsSummary {
    /// Start of the window (inclusive).
    pub window_start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub window_end: DateTime<Utc>,
    /// Number of completed rides.
    pub total_rides: i64,
    /// Sum of `total_fare`.
    #[ts(as = "String")]
    pub total_earnings: Decimal,
    /// Sum of `duration_minutes`.
    pub total_minutes: i64,
    /// `total_minutes / 60`, two decimal places.
    #[ts(as = "String")]
    pub total_hours: Decimal,
}

/// Ride counts and spend for one rider or driver.
///
/// `total_rides` counts every ride in any status; the money fields cover
/// completed rides only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RideStats {
    /// Rides in any status.
    pub total_rides: i64,
    /// Rides that reached `completed`.
    pub completed_rides: i64,
    /// Sum of `total_fare` over completed rides.
    #[ts(as = "String")]
    pub total_fare: Decimal,
    /// Mean `total_fare` over completed rides, two decimal places; zero
    /// when there are none.
    #[ts(as = "String")]
    pub average_fare: Decimal,
}

/// A rider's account with their ride totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RiderProfile {
    /// The account.
    pub rider: Rider,
    /// Ride totals.
    pub stats: RideStats,
}

/// A driver's account with their ride totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DriverProfile {
    /// The account.
    pub driver: Driver,
    /// Ride totals.
    pub stats: RideStats,
}

/// One row of the dispatcher's driver performance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DriverPerformance {
    /// Driver identifier.
    pub driver_id: DriverId,
    /// Display name.
    pub name: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Rides counted in the report window.
    pub total_rides: i64,
    /// Of those, rides that reached `completed`.
    pub completed_rides: i64,
    /// Sum of `total_fare`.
    #[ts(as = "String")]
    pub total_earnings: Decimal,
    /// Sum of `duration_minutes`.
    pub total_minutes: i64,
    /// Mean `total_fare`, two decimal places; `None` without billed rides.
    #[ts(as = "Option<String>")]
    pub average_fare: Option<Decimal>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total matching items across all pages.
    pub total: i64,
    /// Page size requested.
    pub limit: i64,
    /// Offset requested.
    pub offset: i64,
}
