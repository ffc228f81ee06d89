//! Deterministic transformers for calsynth.
//!
//! Every function in this crate is a pure function of its input tables, a
//! [`config::GenerateConfig`] and a seed: the same inputs always produce
//! the same output tables, which is what makes checkpoint reuse and the
//! reproducibility tests sound.

pub mod attendees;
pub mod builders;
pub mod checks;
pub mod config;
pub mod errors;
pub mod personal;
pub mod recurrence;
pub mod rng;
pub mod seeds;
pub mod work_events;

pub use attendees::assign_attendees;
pub use builders::{build_calendars, build_shares, build_users};
pub use checks::{CheckReport, CheckResult, run_checks};
pub use config::{GenerateConfig, RsvpWeights};
pub use errors::GenerateError;
pub use personal::events_from_drafts;
pub use recurrence::{Frequency, Occurrences, RecurrenceRule};
pub use seeds::{MeetingCadence, MeetingTemplate, SeedCatalog};
pub use work_events::generate_work_events;
