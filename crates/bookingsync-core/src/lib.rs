//! Core types: units, bookings, date spans, event materialization

pub mod error;
pub mod materialize;
pub mod model;
pub mod span;
pub mod tracing;

pub use error::ValidationError;
pub use materialize::{sanitize_event_id, EventContent, Materializer, DEFAULT_COLOR_ID};
pub use model::{Booking, BookingStatus, Unit};
pub use span::DateSpan;
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
