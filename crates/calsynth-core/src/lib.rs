//! Core contracts for calsynth.
//!
//! This crate defines the relational records produced by the generation
//! pipeline, the profile models shared with the content generator, and
//! structural validation over a generated dataset.

pub mod dataset;
pub mod error;
pub mod org;
pub mod profile;
pub mod records;
pub mod status;
pub mod validation;

pub use dataset::{Dataset, TableCounts};
pub use error::{CoreError, Result};
pub use org::OrgPerson;
pub use profile::{Personal, PersonalEventDraft, PersonalLife, Professional, UserProfile};
pub use records::{Attendee, Calendar, CalendarKind, CalendarShare, Event, User, calendar_id};
pub use status::{RsvpStatus, SqlDialect, StatusPolicy};
pub use validation::{ValidationIssue, ensure_valid, validate_dataset};

/// Current contract version for checkpoint artifacts.
pub const DATASET_VERSION: &str = "0.1";
