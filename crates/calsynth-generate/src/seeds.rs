use std::collections::HashSet;
use std::path::Path;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use calsynth_core::OrgPerson;

use crate::errors::GenerateError;

/// Cadence of a templated work meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeetingCadence {
    Daily,
    Weekly { day: String },
    Biweekly { day: String },
    Monthly { ordinal: u8, day: String },
}

/// One entry from the work-event template catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingTemplate {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub cadence: MeetingCadence,
    /// Start of day time, `HH:MM`.
    pub time: String,
    pub duration_minutes: i64,
    pub location: String,
}

/// The two seed catalogs the pipeline is grown from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCatalog {
    pub organization: Vec<OrgPerson>,
    pub templates: Vec<MeetingTemplate>,
}

const ORGANIZATION_JSON: &str = include_str!("../assets/company_organization.json");
const TEMPLATES_JSON: &str = include_str!("../assets/work_event_templates.json");

impl SeedCatalog {
    /// Catalogs compiled into the binary; the default data source.
    pub fn embedded() -> Result<Self, GenerateError> {
        Self::from_json(ORGANIZATION_JSON, TEMPLATES_JSON)
    }

    /// Catalogs loaded from a directory holding `company_organization.json`
    /// and `work_event_templates.json`.
    pub fn from_dir(dir: &Path) -> Result<Self, GenerateError> {
        let organization = std::fs::read_to_string(dir.join("company_organization.json"))?;
        let templates = std::fs::read_to_string(dir.join("work_event_templates.json"))?;
        Self::from_json(&organization, &templates)
    }

    fn from_json(organization: &str, templates: &str) -> Result<Self, GenerateError> {
        let catalog = Self {
            organization: serde_json::from_str(organization)?,
            templates: serde_json::from_str(templates)?,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Keep only the first `count` people; managers referenced by the
    /// remaining people must survive the cut.
    pub fn truncated(mut self, count: usize) -> Self {
        if count < self.organization.len() {
            self.organization.truncate(count);
            let names: HashSet<String> = self
                .organization
                .iter()
                .map(|person| person.full_name())
                .collect();
            for person in &mut self.organization {
                if !person.reports_to.is_empty() && !names.contains(&person.reports_to) {
                    person.reports_to = String::new();
                }
            }
        }
        self
    }

    fn validate(&self) -> Result<(), GenerateError> {
        if self.organization.is_empty() {
            return Err(GenerateError::InvalidCatalog(
                "organization catalog is empty".to_string(),
            ));
        }
        if self.templates.is_empty() {
            return Err(GenerateError::InvalidCatalog(
                "work-event template catalog is empty".to_string(),
            ));
        }

        let mut emails = HashSet::new();
        for person in &self.organization {
            if !emails.insert(person.email.to_lowercase()) {
                return Err(GenerateError::InvalidCatalog(format!(
                    "duplicate email '{}'",
                    person.email
                )));
            }
        }

        for template in &self.templates {
            let day = match &template.cadence {
                MeetingCadence::Daily => None,
                MeetingCadence::Weekly { day } | MeetingCadence::Biweekly { day } => Some(day),
                MeetingCadence::Monthly { ordinal, day } => {
                    if !(1..=5).contains(ordinal) {
                        return Err(GenerateError::InvalidCatalog(format!(
                            "template '{}' has ordinal {} outside 1..=5",
                            template.name, ordinal
                        )));
                    }
                    Some(day)
                }
            };
            if let Some(day) = day
                && parse_weekday(day).is_none()
            {
                return Err(GenerateError::InvalidCatalog(format!(
                    "template '{}' names unknown weekday '{}'",
                    template.name, day
                )));
            }
            if parse_time_of_day(&template.time).is_none() {
                return Err(GenerateError::InvalidCatalog(format!(
                    "template '{}' has malformed time '{}'",
                    template.name, template.time
                )));
            }
            if template.duration_minutes <= 0 {
                return Err(GenerateError::InvalidCatalog(format!(
                    "template '{}' has non-positive duration",
                    template.name
                )));
            }
        }

        Ok(())
    }
}

/// Accepts full English names (`Monday`) and iCalendar codes (`MO`).
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "Monday" | "MO" => Some(Weekday::Mon),
        "Tuesday" | "TU" => Some(Weekday::Tue),
        "Wednesday" | "WE" => Some(Weekday::Wed),
        "Thursday" | "TH" => Some(Weekday::Thu),
        "Friday" | "FR" => Some(Weekday::Fri),
        "Saturday" | "SA" => Some(Weekday::Sat),
        "Sunday" | "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

/// iCalendar two-letter code for a weekday.
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Parse `HH:MM` into a time of day.
pub fn parse_time_of_day(value: &str) -> Option<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(value, "%H:%M").ok()
}
