use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// RSVP status weights for one attendee role. Values are relative weights,
/// not probabilities; they are normalized at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsvpWeights {
    pub accepted: f64,
    pub declined: f64,
    pub tentative: f64,
    pub no_response: f64,
}

impl RsvpWeights {
    pub fn total(&self) -> f64 {
        self.accepted + self.declined + self.tentative + self.no_response
    }

    /// Defaults for required attendees.
    pub fn required() -> Self {
        Self {
            accepted: 0.85,
            declined: 0.05,
            tentative: 0.08,
            no_response: 0.02,
        }
    }

    /// Defaults for optional attendees.
    pub fn optional() -> Self {
        Self {
            accepted: 0.60,
            declined: 0.20,
            tentative: 0.15,
            no_response: 0.05,
        }
    }
}

/// Knobs for the deterministic transformers. The date window and the
/// generation timestamp are fixed once per run so repeated runs with the
/// same seed reproduce the same tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// First day events may be placed on (inclusive).
    pub window_start: NaiveDate,
    /// Last day events may be placed on (inclusive).
    pub window_end: NaiveDate,
    /// Timestamp stamped into `updated_at` columns.
    pub generated_at: NaiveDateTime,
    /// Cap on work events per user per working day.
    pub max_events_per_day: usize,
    /// Earliest hour a shifted work event may start.
    pub business_start_hour: u32,
    /// Latest hour a work event may end.
    pub business_end_hour: u32,
    /// Bounds (days) for how far ahead of its start an event was created.
    pub lead_days_min: i64,
    pub lead_days_max: i64,
    pub required_weights: RsvpWeights,
    pub optional_weights: RsvpWeights,
    /// Allowed absolute deviation per status in the distribution check.
    pub distribution_tolerance: f64,
}

impl GenerateConfig {
    pub fn for_window(
        window_start: NaiveDate,
        window_end: NaiveDate,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            window_start,
            window_end,
            generated_at,
            max_events_per_day: 6,
            business_start_hour: 8,
            business_end_hour: 18,
            lead_days_min: 7,
            lead_days_max: 45,
            required_weights: RsvpWeights::required(),
            optional_weights: RsvpWeights::optional(),
            distribution_tolerance: 0.15,
        }
    }
}
