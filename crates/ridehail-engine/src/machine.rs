//! The ride state machine.
//!
//! Four edges exist and each is driven by exactly one operation:
//!
//! | Transition | From | To |
//! |---|---|---|
//! | [`Transition::Assign`] | `pending` | `assigned` |
//! | [`Transition::Start`] | `assigned` | `in_progress` |
//! | [`Transition::Complete`] | `in_progress` | `completed` |
//! | [`Transition::Cancel`] | `pending` | `cancelled` |

use ridehail_types::{RideId, RideStatus};

use crate::error::TransitionError;

/// A legal edge of the ride lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A dispatcher binds a driver.
    Assign,
    /// The driver picks up the rider.
    Start,
    /// The driver drops off the rider; billing is written.
    Complete,
    /// The rider withdraws an unassigned request.
    Cancel,
}

impl Transition {
    /// Every transition.
    pub const ALL: [Self; 4] = [Self::Assign, Self::Start, Self::Complete, Self::Cancel];

    /// The only status this transition may start from.
    pub const fn from(self) -> RideStatus {
        match self {
            Self::Assign | Self::Cancel => RideStatus::Pending,
            Self::Start => RideStatus::Assigned,
            Self::Complete => RideStatus::InProgress,
        }
    }

    /// The status this transition writes.
    pub const fn to(self) -> RideStatus {
        match self {
            Self::Assign => RideStatus::Assigned,
            Self::Start => RideStatus::InProgress,
            Self::Complete => RideStatus::Completed,
            Self::Cancel => RideStatus::Cancelled,
        }
    }

    /// Check that a ride locked in `current` may take this transition.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] for any other status.
    pub const fn check(self, ride_id: RideId, current: RideStatus) -> Result<(), TransitionError> {
        if matches!(
            (current, self.from()),
            (RideStatus::Pending, RideStatus::Pending)
                | (RideStatus::Assigned, RideStatus::Assigned)
                | (RideStatus::InProgress, RideStatus::InProgress)
        ) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                ride_id,
                from: current,
                to: self.to(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use ridehail_types::RideStatus;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn edges_agree_with_status_graph() {
        for transition in Transition::ALL {
            assert!(transition.from().can_transition_to(transition.to()));
        }
    }

    #[test]
    fn only_listed_edges_are_legal() {
        let ride_id = RideId::new();
        for transition in Transition::ALL {
            for status in RideStatus::ALL {
                let result = transition.check(ride_id, status);
                if status == transition.from() {
                    assert!(result.is_ok(), "{transition:?} from {status}");
                } else {
                    let err = result.unwrap_err();
                    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
                }
            }
        }
    }

    #[test]
    fn every_legal_status_edge_has_a_transition() {
        for from in RideStatus::ALL {
            for to in RideStatus::ALL {
                if from.can_transition_to(to) {
                    assert!(
                        Transition::ALL
                            .iter()
                            .any(|t| t.from() == from && t.to() == to),
                        "{from} -> {to}"
                    );
                }
            }
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        let ride_id = RideId::new();
        for transition in Transition::ALL {
            assert!(transition.check(ride_id, RideStatus::Completed).is_err());
            assert!(transition.check(ride_id, RideStatus::Cancelled).is_err());
        }
    }
}
