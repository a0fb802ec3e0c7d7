//! Booking lifecycle state machine.
//!
//! Transitions and their trigger actors:
//!
//! | From       | To allowed            | Actor                                  |
//! |------------|-----------------------|----------------------------------------|
//! | Pending    | Confirmed, Cancelled  | requester may cancel; operator may confirm or cancel |
//! | Confirmed  | CheckedIn, Cancelled  | operator                               |
//! | CheckedIn  | CheckedOut            | operator                               |
//! | CheckedOut | (terminal)            |                                        |
//! | Cancelled  | (terminal)            |                                        |
//!
//! The functions here only decide legality; applying a transition to a row
//! is the ledger's job and happens as a compare-and-swap on the prior
//! status, so a failed transition leaves the row untouched.

use crate::error::ReservationError;
use crate::roles::CallerRole;
use crate::status::BookingStatus;

/// Returns the set of statuses reachable from `from`.
///
/// Terminal states return an empty slice.
pub fn valid_transitions(from: BookingStatus) -> &'static [BookingStatus] {
    use BookingStatus::*;
    match from {
        Pending => &[Confirmed, Cancelled],
        Confirmed => &[CheckedIn, Cancelled],
        CheckedIn => &[CheckedOut],
        CheckedOut | Cancelled => &[],
    }
}

/// Check whether a transition from `from` to `to` is legal.
pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a transition, distinguishing a terminal source from an
/// unreachable target.
pub fn validate_transition(
    from: BookingStatus,
    to: BookingStatus,
) -> Result<(), ReservationError> {
    if can_transition(from, to) {
        return Ok(());
    }
    if from.is_terminal() {
        Err(ReservationError::AlreadyTerminal { status: from })
    } else {
        Err(ReservationError::InvalidTransition { from, to })
    }
}

/// Whether `role` may trigger the (already legal) `from -> to` transition.
///
/// Requesters may only cancel a pending booking; operators drive every
/// other transition in the table.
pub fn can_trigger(role: CallerRole, from: BookingStatus, to: BookingStatus) -> bool {
    match role {
        CallerRole::Operator => true,
        CallerRole::Requester => {
            from == BookingStatus::Pending && to == BookingStatus::Cancelled
        }
    }
}
