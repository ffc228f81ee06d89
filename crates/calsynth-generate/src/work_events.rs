use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::Rng;
use tracing::debug;

use calsynth_core::{CalendarKind, Event, calendar_id};

use crate::config::GenerateConfig;
use crate::errors::GenerateError;
use crate::recurrence::RecurrenceRule;
use crate::rng::sub_rng;
use crate::seeds::{MeetingCadence, MeetingTemplate, parse_time_of_day, parse_weekday, weekday_code};

/// Expand the template catalog into concrete work events for one user.
///
/// Placement is weekday-only, capped per working day, and non-overlapping
/// within the user's work calendar: a colliding occurrence is shifted in
/// 30-minute steps inside business hours, or dropped when no slot fits.
pub fn generate_work_events(
    user_id: i64,
    templates: &[MeetingTemplate],
    cfg: &GenerateConfig,
    seed: u64,
) -> Result<Vec<Event>, GenerateError> {
    let mut rng = sub_rng(seed, &format!("work_events.user_{user_id}"));
    let work_calendar = calendar_id(user_id, CalendarKind::Work);
    let mut occupancy: HashMap<NaiveDate, Vec<(NaiveDateTime, NaiveDateTime)>> = HashMap::new();
    let mut events = Vec::new();
    let mut dropped = 0_u32;

    for template in templates {
        let rrule = rrule_for(&template.cadence);
        let rule = RecurrenceRule::parse(&rrule)?;
        let time = parse_time_of_day(&template.time).ok_or_else(|| {
            GenerateError::InvalidCatalog(format!(
                "template '{}' has malformed time '{}'",
                template.name, template.time
            ))
        })?;
        let dtstart = cfg.window_start.and_time(time);
        let duration = Duration::minutes(template.duration_minutes);

        for occurrence in rule.expand(dtstart, cfg.window_end, &[]) {
            if is_weekend(occurrence.date()) {
                continue;
            }
            let day_slots = occupancy.entry(occurrence.date()).or_default();
            if day_slots.len() >= cfg.max_events_per_day {
                dropped += 1;
                continue;
            }
            let Some(start) = place(occurrence, duration, day_slots, cfg) else {
                dropped += 1;
                continue;
            };
            let end = start + duration;
            day_slots.push((start, end));

            let lead = rng.random_range(cfg.lead_days_min..=cfg.lead_days_max);
            let created_at = start - Duration::days(lead);
            events.push(Event {
                user_id,
                title: template.name.clone(),
                description: Some(template.description.clone()),
                start_time: Some(start),
                end_time: Some(end),
                location: Some(template.location.clone()),
                all_day: false,
                calendar_id: work_calendar.clone(),
                rrule: Some(rrule.clone()),
                duration_minutes: None,
                exdates: Vec::new(),
                created_at,
                updated_at: created_at,
            });
        }
    }

    if dropped > 0 {
        debug!(user_id, dropped, "work events dropped by cap or collisions");
    }
    Ok(events)
}

/// RRULE string matching a template cadence.
pub fn rrule_for(cadence: &MeetingCadence) -> String {
    match cadence {
        MeetingCadence::Daily => "RRULE:FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR".to_string(),
        MeetingCadence::Weekly { day } => {
            format!("RRULE:FREQ=WEEKLY;BYDAY={}", code_for(day))
        }
        MeetingCadence::Biweekly { day } => {
            format!("RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY={}", code_for(day))
        }
        MeetingCadence::Monthly { ordinal, day } => {
            format!("RRULE:FREQ=MONTHLY;BYDAY={}{}", ordinal, code_for(day))
        }
    }
}

fn code_for(day: &str) -> &'static str {
    parse_weekday(day).map(weekday_code).unwrap_or("MO")
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First collision-free start at or after the requested time, stepping in
/// 30-minute increments and keeping the whole event inside business hours.
fn place(
    requested: NaiveDateTime,
    duration: Duration,
    day_slots: &[(NaiveDateTime, NaiveDateTime)],
    cfg: &GenerateConfig,
) -> Option<NaiveDateTime> {
    let day_start = requested
        .date()
        .and_hms_opt(cfg.business_start_hour, 0, 0)?;
    let day_end = requested
        .date()
        .and_hms_opt(cfg.business_end_hour, 0, 0)?;
    let mut candidate = requested.max(day_start);
    while candidate + duration <= day_end {
        let end = candidate + duration;
        let collides = day_slots
            .iter()
            .any(|(slot_start, slot_end)| candidate < *slot_end && *slot_start < end);
        if !collides {
            return Some(candidate);
        }
        candidate += Duration::minutes(30);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::SeedCatalog;

    fn config() -> GenerateConfig {
        GenerateConfig::for_window(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        )
    }

    fn template(name: &str, cadence: MeetingCadence, time: &str, minutes: i64) -> MeetingTemplate {
        MeetingTemplate {
            name: name.to_string(),
            description: "d".to_string(),
            cadence,
            time: time.to_string(),
            duration_minutes: minutes,
            location: "Room".to_string(),
        }
    }

    #[test]
    fn events_land_on_weekdays_only() {
        let catalog = SeedCatalog::embedded().unwrap();
        let events = generate_work_events(1, &catalog.templates, &config(), 7).unwrap();
        assert!(!events.is_empty());
        for event in &events {
            let start = event.start_time.unwrap();
            assert!(!is_weekend(start.date()), "{} on a weekend", event.title);
        }
    }

    #[test]
    fn daily_standup_covers_every_working_day() {
        let templates = vec![template("Daily Standup", MeetingCadence::Daily, "09:30", 15)];
        let events = generate_work_events(1, &templates, &config(), 7).unwrap();
        // Jan 1-14 2024 has ten working days.
        assert_eq!(events.len(), 10);
    }

    #[test]
    fn colliding_templates_are_shifted_not_stacked() {
        let templates = vec![
            template("First", MeetingCadence::Weekly { day: "Monday".to_string() }, "10:00", 60),
            template("Second", MeetingCadence::Weekly { day: "Monday".to_string() }, "10:00", 60),
        ];
        let events = generate_work_events(1, &templates, &config(), 7).unwrap();
        assert_eq!(events.len(), 4);
        // Within one calendar no two events may overlap.
        for (i, a) in events.iter().enumerate() {
            for b in &events[i + 1..] {
                if a.start_time.unwrap().date() == b.start_time.unwrap().date() {
                    assert!(
                        a.end_time.unwrap() <= b.start_time.unwrap()
                            || b.end_time.unwrap() <= a.start_time.unwrap(),
                        "{} overlaps {}",
                        a.title,
                        b.title
                    );
                }
            }
        }
    }

    #[test]
    fn per_day_cap_is_enforced() {
        let mut cfg = config();
        cfg.max_events_per_day = 1;
        let templates = vec![
            template("First", MeetingCadence::Weekly { day: "Monday".to_string() }, "09:00", 30),
            template("Second", MeetingCadence::Weekly { day: "Monday".to_string() }, "11:00", 30),
        ];
        let events = generate_work_events(1, &templates, &cfg, 7).unwrap();
        let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
        for event in &events {
            *per_day.entry(event.start_time.unwrap().date()).or_default() += 1;
        }
        assert!(per_day.values().all(|count| *count <= 1));
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let catalog = SeedCatalog::embedded().unwrap();
        let first = generate_work_events(3, &catalog.templates, &config(), 99).unwrap();
        let second = generate_work_events(3, &catalog.templates, &config(), 99).unwrap();
        assert_eq!(first, second);
        let other_seed = generate_work_events(3, &catalog.templates, &config(), 100).unwrap();
        assert_ne!(first, other_seed);
    }

    #[test]
    fn created_at_precedes_start() {
        let catalog = SeedCatalog::embedded().unwrap();
        let events = generate_work_events(1, &catalog.templates, &config(), 7).unwrap();
        for event in &events {
            assert!(event.created_at < event.start_time.unwrap());
        }
    }
}
