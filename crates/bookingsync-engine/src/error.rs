//! Engine error types.

use bookingsync_core::ValidationError;
use bookingsync_providers::ProviderError;
use thiserror::Error;

use crate::report::FailureKind;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while reconciling.
///
/// Everything except [`SyncError::Source`] on the unit listing is caught at a
/// booking or unit boundary and recorded in the pass report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The booking cannot be materialized.
    #[error("booking {booking_id:?} is invalid: {reason}")]
    Validation {
        booking_id: String,
        #[source]
        reason: ValidationError,
    },

    /// A calendar call failed with a non-retryable error.
    #[error(transparent)]
    Provider(ProviderError),

    /// A calendar call kept failing with retryable errors.
    #[error("{operation} gave up after {attempts} attempts: {last}")]
    Exhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        last: ProviderError,
    },

    /// The unit has no calendar and no default is configured.
    #[error("unit {unit_id} has no calendar assigned")]
    MissingCalendar { unit_id: String },

    /// The source store could not be read.
    #[error("source unavailable: {0}")]
    Source(#[source] ProviderError),
}

impl SyncError {
    /// Creates a validation error.
    pub fn validation(booking_id: impl Into<String>, reason: ValidationError) -> Self {
        Self::Validation {
            booking_id: booking_id.into(),
            reason,
        }
    }

    /// Creates a missing calendar error.
    pub fn missing_calendar(unit_id: impl Into<String>) -> Self {
        Self::MissingCalendar {
            unit_id: unit_id.into(),
        }
    }

    /// Returns true for a provider "not found" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_not_found())
    }

    /// Returns true for a provider "already exists" answer.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_conflict())
    }

    /// Returns the report classification.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation { .. } => FailureKind::Validation,
            Self::Provider(_) => FailureKind::Provider,
            Self::Exhausted { .. } => FailureKind::Exhausted,
            Self::MissingCalendar { .. } => FailureKind::MissingCalendar,
            Self::Source(_) => FailureKind::Source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = SyncError::validation("b1", ValidationError::MissingCheckin);
        assert_eq!(err.to_string(), "booking \"b1\" is invalid: booking has no check-in date");

        let err = SyncError::Exhausted {
            operation: "insert",
            attempts: 5,
            last: ProviderError::rate_limited("slow down"),
        };
        assert!(err.to_string().starts_with("insert gave up after 5 attempts"));
        assert_eq!(err.kind(), FailureKind::Exhausted);

        let err = SyncError::missing_calendar("u1");
        assert_eq!(err.to_string(), "unit u1 has no calendar assigned");
    }

    #[test]
    fn provider_classification() {
        assert!(SyncError::Provider(ProviderError::not_found("gone")).is_not_found());
        assert!(SyncError::Provider(ProviderError::conflict("taken")).is_conflict());
        assert!(!SyncError::Source(ProviderError::not_found("gone")).is_not_found());
    }

    #[test]
    fn source_chain_is_kept() {
        use std::error::Error;

        let err = SyncError::validation("b1", ValidationError::MissingBookingId);
        assert!(err.source().is_some());
    }
}
