use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::CoreError;

/// One structural problem found in a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub table: String,
    pub row: usize,
    pub message: String,
}

impl ValidationIssue {
    fn new(table: &str, row: usize, message: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            row,
            message: message.into(),
        }
    }
}

/// Walk the dataset and collect every structural violation: duplicate
/// emails, dangling references, inverted time ranges, and response
/// timestamps outside the `(created_at, start_time)` window.
pub fn validate_dataset(dataset: &Dataset) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut seen_emails = HashSet::new();
    for (row, user) in dataset.users.iter().enumerate() {
        if !seen_emails.insert(user.email.to_lowercase()) {
            issues.push(ValidationIssue::new(
                "users",
                row,
                format!("duplicate email '{}'", user.email),
            ));
        }
    }

    let user_ids: HashSet<i64> = dataset.users.iter().map(|user| user.id).collect();
    let calendar_ids: HashSet<&str> = dataset
        .calendars
        .iter()
        .map(|calendar| calendar.id.as_str())
        .collect();

    for (row, calendar) in dataset.calendars.iter().enumerate() {
        if !user_ids.contains(&calendar.owner_id) {
            issues.push(ValidationIssue::new(
                "calendars",
                row,
                format!("owner {} does not exist", calendar.owner_id),
            ));
        }
    }

    for (row, share) in dataset.shares.iter().enumerate() {
        if !calendar_ids.contains(share.calendar_id.as_str()) {
            issues.push(ValidationIssue::new(
                "calendar_shares",
                row,
                format!("calendar '{}' does not exist", share.calendar_id),
            ));
        }
        if !user_ids.contains(&share.shared_with_id) {
            issues.push(ValidationIssue::new(
                "calendar_shares",
                row,
                format!("shared_with user {} does not exist", share.shared_with_id),
            ));
        }
    }

    // Earliest event per (organizer, title); attendee rows resolve against
    // the first matching event, mirroring the emitted SQL.
    let mut first_event: HashMap<(i64, &str), &crate::records::Event> = HashMap::new();
    for (row, event) in dataset.events.iter().enumerate() {
        if !user_ids.contains(&event.user_id) {
            issues.push(ValidationIssue::new(
                "events",
                row,
                format!("user {} does not exist", event.user_id),
            ));
        }
        if !calendar_ids.contains(event.calendar_id.as_str()) {
            issues.push(ValidationIssue::new(
                "events",
                row,
                format!("calendar '{}' does not exist", event.calendar_id),
            ));
        }
        if !event.all_day
            && let (Some(start), Some(end)) = (event.start_time, event.end_time)
            && start >= end
        {
            issues.push(ValidationIssue::new(
                "events",
                row,
                format!("start {start} is not before end {end}"),
            ));
        }
        first_event
            .entry((event.user_id, event.title.as_str()))
            .or_insert(event);
    }

    for (row, attendee) in dataset.attendees.iter().enumerate() {
        if !user_ids.contains(&attendee.user_id) {
            issues.push(ValidationIssue::new(
                "attendees",
                row,
                format!("user {} does not exist", attendee.user_id),
            ));
        }
        let event = first_event.get(&(attendee.event_user_id, attendee.event_title.as_str()));
        let Some(event) = event else {
            issues.push(ValidationIssue::new(
                "attendees",
                row,
                format!(
                    "no event '{}' owned by user {}",
                    attendee.event_title, attendee.event_user_id
                ),
            ));
            continue;
        };

        if attendee.status.is_responded() {
            match attendee.responded_at {
                None => issues.push(ValidationIssue::new(
                    "attendees",
                    row,
                    format!("status {} requires responded_at", attendee.status),
                )),
                Some(responded) => {
                    if responded <= event.created_at {
                        issues.push(ValidationIssue::new(
                            "attendees",
                            row,
                            format!("responded_at {responded} is not after event creation"),
                        ));
                    }
                    if let Some(start) = event.start_time
                        && responded >= start
                    {
                        issues.push(ValidationIssue::new(
                            "attendees",
                            row,
                            format!("responded_at {responded} is not before event start"),
                        ));
                    }
                }
            }
        } else if attendee.responded_at.is_some() {
            issues.push(ValidationIssue::new(
                "attendees",
                row,
                format!("status {} must not carry responded_at", attendee.status),
            ));
        }
    }

    issues
}

/// Shorthand that turns a non-empty issue list into an error.
pub fn ensure_valid(dataset: &Dataset) -> Result<(), CoreError> {
    let issues = validate_dataset(dataset);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(issues.len()))
    }
}
