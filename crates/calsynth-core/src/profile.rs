use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Personal details of a generated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Personal {
    pub name: String,
    pub email: String,
    pub age: u8,
    pub pronouns: String,
    /// ISO date, e.g. `1988-04-17`.
    pub birthday: String,
    pub phone: String,
    pub city: String,
    pub timezone: String,
}

/// Professional details of a generated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Professional {
    pub role: String,
    pub team: String,
    /// ISO date the person joined the company; becomes the account's
    /// `created_at`.
    pub start_date: String,
    /// Full name of the manager, empty for the top of the chart.
    pub reports_to: String,
    pub workload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonalLife {
    pub marital_status: String,
    /// Hobby names used to theme personal events.
    pub hobbies: Vec<String>,
    pub gym_member: bool,
    pub travel_frequency: String,
}

/// Complete profile for one user, produced by the content generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    pub personal: Personal,
    pub professional: Professional,
    pub personal_life: PersonalLife,
}

/// A personal event as produced by the content generator, before it is
/// normalized into an [`crate::Event`]. Times are ISO strings because the
/// upstream generator emits text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PersonalEventDraft {
    pub title: String,
    pub description: String,
    /// ISO datetime, e.g. `2024-02-05T18:30:00`.
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub is_all_day: bool,
    /// RRULE body for recurring events, empty string for one-shot events.
    #[serde(default)]
    pub recurrence_rule: String,
}
