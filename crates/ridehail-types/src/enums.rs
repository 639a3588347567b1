//! Enumeration types for the ride lifecycle.
//!
//! [`RideStatus`] is the closed set of lifecycle states persisted in the
//! `ride_status` `PostgreSQL` enum. [`NotificationType`] tags rows in the
//! `notifications` table. [`EarningsPeriod`] selects the reporting window for
//! driver earnings summaries.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Ride status
// ---------------------------------------------------------------------------

/// Lifecycle status of a ride.
///
/// ```text
/// pending --> assigned --> in_progress --> completed
///    |
///    +------> cancelled
/// ```
///
/// `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RideStatus {
    /// Requested by a rider, waiting for a dispatcher to assign a driver.
    Pending,
    /// A driver has been assigned but has not started the trip.
    Assigned,
    /// The driver has picked up the rider; the billing clock is running.
    InProgress,
    /// The trip ended and billing fields are set.
    Completed,
    /// The rider cancelled before assignment.
    Cancelled,
}

impl RideStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Assigned,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// The `PostgreSQL` enum label for this status.
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a `PostgreSQL` enum label. Returns `None` for unknown labels.
    pub fn from_db_str(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_db_str() == label)
    }

    /// Whether no further transition is possible from this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a driver is bound to the ride in this status.
    pub const fn binds_driver(self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress)
    }

    /// Whether `next` is a legal successor of `self`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Assigned | Self::Cancelled)
                | (Self::Assigned, Self::InProgress)
                | (Self::InProgress, Self::Completed)
        )
    }
}

impl core::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

// ---------------------------------------------------------------------------
// Notification type
// ---------------------------------------------------------------------------

/// Category tag stored with every notification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum NotificationType {
    /// A rider requested a new ride (addressed to dispatchers).
    NewRideRequest,
    /// A driver was assigned to a ride.
    RideAssigned,
    /// Generic ride progress update.
    RideUpdate,
    /// The driver started the ride.
    RideStarted,
    /// The ride completed and was billed.
    RideCompleted,
}

impl NotificationType {
    /// The `PostgreSQL` enum label for this type.
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::NewRideRequest => "new_ride_request",
            Self::RideAssigned => "ride_assigned",
            Self::RideUpdate => "ride_update",
            Self::RideStarted => "ride_started",
            Self::RideCompleted => "ride_completed",
        }
    }

    /// Parse a `PostgreSQL` enum label. Returns `None` for unknown labels.
    pub fn from_db_str(label: &str) -> Option<Self> {
        [
            Self::NewRideRequest,
            Self::RideAssigned,
            Self::RideUpdate,
            Self::RideStarted,
            Self::RideCompleted,
        ]
        .into_iter()
        .find(|t| t.as_db_str() == label)
    }
}

// ---------------------------------------------------------------------------
// Earnings period
// ---------------------------------------------------------------------------

/// Reporting window for a driver earnings summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EarningsPeriod {
    /// The calendar day containing the reference date.
    Daily,
    /// The Monday-to-Sunday week containing the reference date.
    Weekly,
    /// The calendar month containing the reference date.
    Monthly,
}

impl EarningsPeriod {
    /// Half-open UTC window `[start, end)` covering the period that contains
    /// `date`. Returns `None` only at the edges of the representable calendar.
    pub fn window(self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (start, end) = match self {
            Self::Daily => (date, date.checked_add_days(Days::new(1))?),
            Self::Weekly => {
                let back = u64::from(date.weekday().num_days_from_monday());
                let monday = date.checked_sub_days(Days::new(back))?;
                (monday, monday.checked_add_days(Days::new(7))?)
            }
            Self::Monthly => {
                let first = date.with_day(1)?;
                (first, first.checked_add_months(Months::new(1))?)
            }
        };
        Some((start_of_day(start), start_of_day(end)))
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_db_labels_round_trip() {
        for status in RideStatus::ALL {
            assert_eq!(RideStatus::from_db_str(status.as_db_str()), Some(status));
        }
        assert_eq!(RideStatus::from_db_str("archived"), None);
    }

    #[test]
    fn only_lifecycle_edges_are_legal() {
        let legal = [
            (RideStatus::Pending, RideStatus::Assigned),
            (RideStatus::Pending, RideStatus::Cancelled),
            (RideStatus::Assigned, RideStatus::InProgress),
            (RideStatus::InProgress, RideStatus::Completed),
        ];
        for from in RideStatus::ALL {
            for to in RideStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_successors() {
        for status in [RideStatus::Completed, RideStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(RideStatus::ALL.iter().all(|s| !status.can_transition_to(*s)));
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&RideStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn daily_window_covers_one_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let (start, end) = EarningsPeriod::Daily.window(date).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-03-15T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-16T00:00:00+00:00");
    }

    #[test]
    fn weekly_window_starts_on_monday() {
        // 2026-03-15 is a Sunday.
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let (start, end) = EarningsPeriod::Weekly.window(date).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-03-09T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-16T00:00:00+00:00");
    }

    #[test]
    fn monthly_window_handles_year_end() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let (start, end) = EarningsPeriod::Monthly.window(date).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }
}
