//! Validation errors for booking records.

use chrono::NaiveDate;
use thiserror::Error;

/// A booking record that cannot be projected onto a calendar.
///
/// Validation errors never abort a pass: the booking is skipped for this run
/// and reported, while sibling bookings continue to sync.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The booking has no identifier.
    #[error("booking has no id")]
    MissingBookingId,

    /// The booking has no check-in date.
    #[error("booking has no check-in date")]
    MissingCheckin,

    /// The checkout date does not come after the check-in date.
    #[error("checkout {checkout} is not after check-in {checkin}")]
    CheckoutNotAfterCheckin {
        checkin: NaiveDate,
        checkout: NaiveDate,
    },
}
