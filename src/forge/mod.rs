//! Completion-record forgery.
//!
//! `record` models the platform's SCORM-like tracking record and rewrites
//! it to assert full completion; `envelope` serializes the result into the
//! dual-encoded wire format the submit endpoint expects.

pub mod envelope;
pub mod record;

pub use envelope::{forge, WireEnvelope};
pub use record::{Interaction, TrackingRecord};
