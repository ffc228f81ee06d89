use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;
use tracing::debug;

use calsynth_core::{CalendarKind, Event, PersonalEventDraft, calendar_id};

use crate::config::GenerateConfig;
use crate::errors::GenerateError;
use crate::recurrence::RecurrenceRule;
use crate::rng::sub_rng;

/// Normalize generated personal-event drafts into event rows on the user's
/// personal calendar.
///
/// Drafts come from a text generator and are treated accordingly: an
/// unparsable recurrence rule demotes the event to one-shot, and an end
/// time at or before the start is pushed an hour out. An unparsable
/// timestamp is an error; those are repaired upstream before this point.
pub fn events_from_drafts(
    user_id: i64,
    drafts: &[PersonalEventDraft],
    cfg: &GenerateConfig,
    seed: u64,
) -> Result<Vec<Event>, GenerateError> {
    let mut rng = sub_rng(seed, &format!("personal_events.user_{user_id}"));
    let personal_calendar = calendar_id(user_id, CalendarKind::Personal);
    let mut events = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let start = parse_datetime(&draft.start_time, "start_time")?;
        let mut end = parse_datetime(&draft.end_time, "end_time")?;
        if !draft.is_all_day && end <= start {
            debug!(title = %draft.title, "end at or before start, pushing out an hour");
            end = start + Duration::hours(1);
        }

        let rrule = normalize_rrule(&draft.recurrence_rule, &draft.title);

        let lead = rng.random_range(cfg.lead_days_min..=cfg.lead_days_max);
        let created_at = start - Duration::days(lead);
        events.push(Event {
            user_id,
            title: draft.title.clone(),
            description: non_empty(&draft.description),
            start_time: Some(start),
            end_time: Some(end),
            location: non_empty(&draft.location),
            all_day: draft.is_all_day,
            calendar_id: personal_calendar.clone(),
            rrule,
            duration_minutes: None,
            exdates: Vec::new(),
            created_at,
            updated_at: created_at,
        });
    }

    Ok(events)
}

fn normalize_rrule(raw: &str, title: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_prefix = if trimmed.starts_with("RRULE:") {
        trimmed.to_string()
    } else {
        format!("RRULE:{trimmed}")
    };
    match RecurrenceRule::parse(&with_prefix) {
        Ok(_) => Some(with_prefix),
        Err(err) => {
            debug!(title = %title, %err, "dropping unparsable recurrence rule");
            None
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_datetime(value: &str, field: &str) -> Result<NaiveDateTime, GenerateError> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default());
    }
    Err(GenerateError::InvalidDatetime {
        field: field.to_string(),
        value: value.to_string(),
    })
}
