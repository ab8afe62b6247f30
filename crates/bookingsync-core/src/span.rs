//! Half-open all-day date spans.
//!
//! A [`DateSpan`] covers `[start, end)`: a stay from the 1st to the 3rd blocks
//! the 1st and the 2nd, never the 3rd. This matches the all-day convention
//! calendar providers use for `start.date` / `end.date`.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::ValidationError;

/// An all-day date range, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    /// Creates a span covering `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::CheckoutNotAfterCheckin`] when `end <= start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::CheckoutNotAfterCheckin {
                checkin: start,
                checkout: end,
            });
        }
        Ok(Self { start, end })
    }

    /// A one-night block starting on `checkin`.
    ///
    /// This is the documented fallback for bookings that carry a check-in
    /// date but no checkout date.
    pub fn single_night(checkin: NaiveDate) -> Self {
        let end = checkin.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
        Self {
            start: checkin,
            end,
        }
    }

    /// Builds the blocked span for a stay.
    ///
    /// - both dates present: `[checkin, checkout)`
    /// - checkout missing: [`DateSpan::single_night`]
    /// - check-in missing: error, whatever the checkout says
    pub fn from_stay(
        checkin: Option<NaiveDate>,
        checkout: Option<NaiveDate>,
    ) -> Result<Self, ValidationError> {
        match (checkin, checkout) {
            (Some(checkin), Some(checkout)) => Self::new(checkin, checkout),
            (Some(checkin), None) => Ok(Self::single_night(checkin)),
            (None, _) => Err(ValidationError::MissingCheckin),
        }
    }

    /// First blocked day.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end: the first day that is *not* blocked.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Last blocked day (the last night of the stay).
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }

    /// Number of blocked days.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Returns true if `day` is blocked by this span.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Iterates over every blocked day.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d < self.end)
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
