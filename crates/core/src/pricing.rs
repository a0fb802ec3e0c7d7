//! Total price computation.
//!
//! Currency is tracked in integer minor units throughout, so there is no
//! rounding to get wrong: a stay costs the nightly rate times the number of
//! nights, nothing more.

use crate::stay::StayRange;

/// Total price for a stay at the given nightly rate (minor currency units).
pub fn total_for_stay(nightly_rate: i64, stay: &StayRange) -> i64 {
    nightly_rate * stay.nights()
}
