use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The seven pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Profiles,
    Dataframes,
    WorkEvents,
    PersonalEvents,
    Attendees,
    Sql,
    ExecuteSql,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Step::Profiles,
        Step::Dataframes,
        Step::WorkEvents,
        Step::PersonalEvents,
        Step::Attendees,
        Step::Sql,
        Step::ExecuteSql,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Profiles => "profiles",
            Step::Dataframes => "dataframes",
            Step::WorkEvents => "work_events",
            Step::PersonalEvents => "personal_events",
            Step::Attendees => "attendees",
            Step::Sql => "sql",
            Step::ExecuteSql => "execute_sql",
        }
    }

    /// Whether the step calls the external content generator.
    pub fn uses_content_generator(&self) -> bool {
        matches!(self, Step::Profiles | Step::PersonalEvents)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Step::ALL
            .into_iter()
            .find(|step| step.as_str() == value)
            .ok_or_else(|| {
                format!(
                    "unknown step '{value}', expected one of: {}",
                    Step::ALL.map(|step| step.as_str()).join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_round_trip() {
        for step in Step::ALL {
            assert_eq!(step.as_str().parse::<Step>().unwrap(), step);
        }
        assert!("events".parse::<Step>().is_err());
    }

    #[test]
    fn content_steps_are_flagged() {
        assert!(Step::Profiles.uses_content_generator());
        assert!(Step::PersonalEvents.uses_content_generator());
        assert!(!Step::WorkEvents.uses_content_generator());
    }
}
