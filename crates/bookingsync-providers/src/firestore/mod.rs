//! Cloud Firestore booking source.
//!
//! Units live in one collection keyed by unit id; bookings in another, each
//! pointing at its unit through a `unitId` field. Access goes through the
//! REST API with the same token sources as the calendar client.

mod client;
mod value;

pub use client::{FirestoreLayout, FirestoreSource};
