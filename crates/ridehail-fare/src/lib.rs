//! Tiered fare calculation for completed rides.
//!
//! A ride is billed a flat base fare for its first `base_hours` hours. Every
//! started hour beyond that is billed at `additional_hour_rate`:
//!
//! | Duration | Additional hours | Total (defaults) |
//! |----------|------------------|------------------|
//! | 0 -- 180 min | 0 | 450 |
//! | 181 -- 240 min | 1 | 550 |
//! | 241 -- 300 min | 2 | 650 |
//!
//! The calculator is pure: it never fails and never touches the store.
//! All amounts use [`Decimal`] -- no floating point.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use ridehail_types::Fare;

/// Minutes per billed hour.
const MINUTES_PER_HOUR: u32 = 60;

/// Default flat fare for the base hours.
pub const DEFAULT_BASE_FARE: Decimal = Decimal::from_parts(450, 0, 0, false, 0);

/// Default number of hours covered by the base fare.
pub const DEFAULT_BASE_HOURS: u32 = 3;

/// Default rate for each started hour beyond the base hours.
pub const DEFAULT_ADDITIONAL_HOUR_RATE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// The configurable rate card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FareSchedule {
    /// Flat fare covering the first `base_hours` hours.
    #[serde(default = "default_base_fare")]
    pub base_fare: Decimal,

    /// Hours covered by the base fare.
    #[serde(default = "default_base_hours")]
    pub base_hours: u32,

    /// Charge for each started hour beyond `base_hours`.
    #[serde(default = "default_additional_hour_rate")]
    pub additional_hour_rate: Decimal,
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self {
            base_fare: DEFAULT_BASE_FARE,
            base_hours: DEFAULT_BASE_HOURS,
            additional_hour_rate: DEFAULT_ADDITIONAL_HOUR_RATE,
        }
    }
}

impl FareSchedule {
    /// Minutes covered by the base fare.
    pub const fn base_minutes(&self) -> u32 {
        self.base_hours.saturating_mul(MINUTES_PER_HOUR)
    }

    /// Compute the fare for a ride lasting `duration_minutes`.
    ///
    /// A zero-length ride is billed the base fare.
    pub fn calculate(&self, duration_minutes: u32) -> Fare {
        let excess = duration_minutes.saturating_sub(self.base_minutes());
        let additional_hours = excess.div_ceil(MINUTES_PER_HOUR);
        let additional_fare = self
            .additional_hour_rate
            .saturating_mul(Decimal::from(additional_hours));

        Fare {
            base_fare: self.base_fare,
            additional_hours,
            additional_fare,
            total_fare: self.base_fare.saturating_add(additional_fare),
        }
    }
}

/// Whole minutes between `started_at` and `ended_at`, rounded up.
///
/// Any partial minute counts as a full minute. A non-positive interval
/// (clock skew) yields 0.
pub fn elapsed_minutes(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> u32 {
    const MILLIS_PER_MINUTE: u64 = 60_000;

    let millis = ended_at.signed_duration_since(started_at).num_milliseconds();
    let Ok(millis) = u64::try_from(millis) else {
        return 0;
    };
    u32::try_from(millis.div_ceil(MILLIS_PER_MINUTE)).unwrap_or(u32::MAX)
}

fn default_base_fare() -> Decimal {
    DEFAULT_BASE_FARE
}

const fn default_base_hours() -> u32 {
    DEFAULT_BASE_HOURS
}

fn default_additional_hour_rate() -> Decimal {
    DEFAULT_ADDITIONAL_HOUR_RATE
}
