use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};

use calsynth_core::{Event, OrgPerson, UserProfile};

/// Prompt for growing a complete profile from an organization entry.
pub fn profile_prompt(person: &OrgPerson) -> String {
    format!(
        r#"You are an expert at creating realistic user profiles for software company employees.
Generate a complete user profile for the following person.

Company Person Information:
- Name: {name}
- Email: {email}
- Position: {position}
- Team: {team}
- Reports to: {reports_to}
- Description: {description}
- Work Behavior: {work_behavior}
- Personal Life: {personal_life}

Requirements:
- Keep the name, email, team and reports_to exactly as given.
- Personal details (age, pronouns, birthday, phone, city, timezone) must be
  realistic and consistent with the description.
- start_date must be an ISO date (YYYY-MM-DD) in the past.
- hobbies must reflect the personal life description.
- Never use null values; use empty strings or empty arrays instead.
"#,
        name = person.full_name(),
        email = person.email,
        position = person.position,
        team = person.team,
        reports_to = person.reports_to,
        description = person.description,
        work_behavior = person.work_behavior,
        personal_life = person.personal_life,
    )
}

/// Prompt for generating personal events around a work schedule.
pub fn personal_events_prompt(profile: &UserProfile, work_schedule: &str) -> String {
    format!(
        r#"You are an expert at creating realistic personal calendar events for software company employees.
Generate 8 to 15 personal events for the next months based on this person's profile and existing work schedule.

User Profile:
- Name: {name}
- Age: {age}
- Role: {role}
- Team: {team}
- Family Status: {family}
- Hobbies: {hobbies}
- Gym member: {gym}
- Travel: {travel}

Existing Work Schedule Summary:
{work_schedule}

Consider doctor appointments, errands, social events, vacation days, family
events, fitness, hobbies, trips and home maintenance.

Requirements:
- Events must be realistic, fit the lifestyle and avoid the work schedule.
- Durations between 15 minutes and 4 hours, except all-day entries.
- Mix recurring and one-time events; weekends and evenings are fine.
- start_time and end_time must be ISO datetimes (YYYY-MM-DDTHH:MM:SS).
- recurrence_rule must be an empty string for one-time events, or an RRULE
  body such as FREQ=WEEKLY;BYDAY=MO for recurring ones. Never use null.
"#,
        name = profile.personal.name,
        age = profile.personal.age,
        role = profile.professional.role,
        team = profile.professional.team,
        family = profile.personal_life.marital_status,
        hobbies = profile.personal_life.hobbies.join(", "),
        gym = profile.personal_life.gym_member,
        travel = profile.personal_life.travel_frequency,
    )
}

/// Weekly work schedule summary fed into the personal-events prompt.
pub fn work_schedule_summary(events: &[Event]) -> String {
    if events.is_empty() {
        return "No work events scheduled".to_string();
    }

    let mut by_day: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut seen = std::collections::HashSet::new();
    for event in events {
        let Some(start) = event.start_time else {
            continue;
        };
        if !seen.insert((event.title.clone(), start.time())) {
            continue;
        }
        let day_number = start.date().weekday().number_from_monday();
        by_day.entry(day_number).or_default().push(format!(
            "{} at {:02}:{:02}",
            event.title,
            start.hour(),
            start.minute()
        ));
    }

    let mut summary = String::from("Weekly Work Schedule:\n");
    for (day_number, entries) in by_day {
        let name = match day_number {
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            6 => "Saturday",
            _ => "Sunday",
        };
        summary.push_str(&format!("- {}: {}\n", name, entries.join(", ")));
    }
    summary
}
