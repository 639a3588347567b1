//! Shared type definitions for the ride-hailing lifecycle service.
//!
//! This crate is the single source of truth for the entities that flow
//! between the store, the transition engine and the role gateways. Types are
//! exported to `TypeScript` via `ts-rs` for the rider, driver and dispatcher
//! clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Ride status, notification type, earnings period
//! - [`structs`] -- Rides, actors, fares, notifications, reporting views

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EarningsPeriod, NotificationType, RideStatus};
pub use ids::{DispatcherId, DriverId, NotificationId, RideId, RiderId};
pub use structs::{
    Coordinates, Dispatcher, Driver, DriverPerformance, DriverProfile, EarningsSummary, Fare,
    NewNotification, Notification, Page, PendingRide, Place, Ride, RideBilling, RideStats, Rider,
    RiderProfile,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::ids::RideId::export_all();
        let _ = crate::ids::RiderId::export_all();
        let _ = crate::ids::DriverId::export_all();
        let _ = crate::ids::DispatcherId::export_all();
        let _ = crate::ids::NotificationId::export_all();

        let _ = crate::enums::RideStatus::export_all();
        let _ = crate::enums::NotificationType::export_all();
        let _ = crate::enums::EarningsPeriod::export_all();

        let _ = crate::structs::Coordinates::export_all();
        let _ = crate::structs::Place::export_all();
        let _ = crate::structs::Fare::export_all();
        let _ = crate::structs::RideBilling::export_all();
        let _ = crate::structs::Ride::export_all();
        let _ = crate::structs::PendingRide::export_all();
        let _ = crate::structs::Driver::export_all();
        let _ = crate::structs::Rider::export_all();
        let _ = crate::structs::Dispatcher::export_all();
        let _ = crate::structs::Notification::export_all();
        let _ = crate::structs::EarningsSummary::export_all();
        let _ = crate::structs::RideStats::export_all();
        let _ = crate::structs::RiderProfile::export_all();
        let _ = crate::structs::DriverProfile::export_all();
        let _ = crate::structs::DriverPerformance::export_all();
    }
}
