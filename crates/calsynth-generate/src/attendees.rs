use std::collections::HashSet;

use chrono::Duration;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use calsynth_core::{Attendee, Event, RsvpStatus, UserProfile};

use crate::config::{GenerateConfig, RsvpWeights};
use crate::rng::sub_rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Organizer,
    Required,
    Optional,
}

/// Assign RSVP rows for every unique `(organizer, title)` event.
///
/// The audience follows the meeting type: 1:1s pull in the manager,
/// standups and sprint ceremonies pull in the team, all-hands pulls in the
/// whole company, personal events stay with the organizer. Profiles are
/// positional: user id = slice index + 1.
pub fn assign_attendees(
    events: &[Event],
    profiles: &[UserProfile],
    cfg: &GenerateConfig,
    seed: u64,
) -> Vec<Attendee> {
    let mut seen: HashSet<(i64, &str)> = HashSet::new();
    let mut attendees = Vec::new();

    for event in events {
        if !seen.insert((event.user_id, event.title.as_str())) {
            continue;
        }
        let organizer = event.user_id;
        let mut rng = sub_rng(seed, &format!("attendees.{organizer}.{}", event.title));
        let audience = resolve_audience(event, organizer, profiles);

        for (position, attendee_id) in audience.iter().enumerate() {
            let role = resolve_role(*attendee_id, organizer, position, audience.len(), &mut rng);
            let status = match role {
                Role::Organizer => RsvpStatus::Accepted,
                Role::Required => pick_status(&mut rng, &cfg.required_weights),
                Role::Optional => pick_status(&mut rng, &cfg.optional_weights),
            };
            let (status, responded_at) = resolve_response(event, status, &mut rng);

            attendees.push(Attendee {
                user_id: *attendee_id,
                event_user_id: organizer,
                event_title: event.title.clone(),
                event_start_time: event.start_time,
                event_end_time: event.end_time,
                status,
                responded_at,
            });
        }
    }

    attendees
}

fn resolve_role(
    attendee_id: i64,
    organizer: i64,
    position: usize,
    total: usize,
    rng: &mut ChaCha8Rng,
) -> Role {
    if attendee_id == organizer {
        Role::Organizer
    } else if position == 1 && total > 1 {
        Role::Required
    } else if rng.random_bool(0.6) {
        Role::Required
    } else {
        Role::Optional
    }
}

/// Response timestamps land strictly inside `(created_at, start_time)`;
/// how early depends on the status (accepts come quickly, tentative
/// answers drag). An event whose window cannot fit a response keeps the
/// attendee pending.
fn resolve_response(
    event: &Event,
    status: RsvpStatus,
    rng: &mut ChaCha8Rng,
) -> (RsvpStatus, Option<chrono::NaiveDateTime>) {
    if !status.is_responded() {
        return (status, None);
    }
    let Some(start) = event.start_time else {
        return (RsvpStatus::Pending, None);
    };
    let window = start - event.created_at;
    if window <= Duration::zero() {
        return (RsvpStatus::Pending, None);
    }

    let (low, high) = match status {
        RsvpStatus::Accepted => (0.05, 0.50),
        RsvpStatus::Declined => (0.05, 0.40),
        _ => (0.30, 0.90),
    };
    let fraction: f64 = rng.random_range(low..high);
    let offset = Duration::seconds((window.num_seconds() as f64 * fraction) as i64);
    let responded = event.created_at + offset.max(Duration::seconds(1));
    (status, Some(responded))
}

fn pick_status(rng: &mut ChaCha8Rng, weights: &RsvpWeights) -> RsvpStatus {
    let roll: f64 = rng.random::<f64>() * weights.total();
    let mut cumulative = weights.accepted;
    if roll < cumulative {
        return RsvpStatus::Accepted;
    }
    cumulative += weights.declined;
    if roll < cumulative {
        return RsvpStatus::Declined;
    }
    cumulative += weights.tentative;
    if roll < cumulative {
        return RsvpStatus::Tentative;
    }
    RsvpStatus::NoResponse
}

fn resolve_audience(event: &Event, organizer: i64, profiles: &[UserProfile]) -> Vec<i64> {
    if event.calendar_id.ends_with("_personal") {
        return vec![organizer];
    }

    let title = event.title.to_lowercase();
    let mut audience = if title.contains("1:1") {
        let mut ids = vec![organizer];
        if let Some(manager) = manager_of(organizer, profiles) {
            ids.push(manager);
        }
        ids
    } else if title.contains("all hands") {
        (1..=profiles.len() as i64).collect()
    } else {
        team_of(organizer, profiles)
    };

    // Organizer leads the list; everyone appears once.
    if let Some(index) = audience.iter().position(|id| *id == organizer) {
        audience.remove(index);
    }
    audience.insert(0, organizer);
    let mut seen = HashSet::new();
    audience.retain(|id| seen.insert(*id));
    audience
}

fn profile_of(user_id: i64, profiles: &[UserProfile]) -> Option<&UserProfile> {
    usize::try_from(user_id - 1)
        .ok()
        .and_then(|index| profiles.get(index))
}

fn manager_of(user_id: i64, profiles: &[UserProfile]) -> Option<i64> {
    let profile = profile_of(user_id, profiles)?;
    let manager = profile.professional.reports_to.as_str();
    if manager.is_empty() {
        return None;
    }
    profiles
        .iter()
        .position(|candidate| candidate.personal.name == manager)
        .map(|index| index as i64 + 1)
}

fn team_of(user_id: i64, profiles: &[UserProfile]) -> Vec<i64> {
    let Some(profile) = profile_of(user_id, profiles) else {
        return vec![user_id];
    };
    let team = profile.professional.team.as_str();
    let members: Vec<i64> = profiles
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.professional.team == team)
        .map(|(index, _)| index as i64 + 1)
        .collect();
    if members.is_empty() {
        vec![user_id]
    } else {
        members
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use calsynth_core::{Personal, PersonalLife, Professional};

    use super::*;

    fn profile(name: &str, team: &str, reports_to: &str) -> UserProfile {
        UserProfile {
            personal: Personal {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                age: 30,
                pronouns: "she/her".to_string(),
                birthday: "1993-02-11".to_string(),
                phone: "+15550101".to_string(),
                city: "Porto".to_string(),
                timezone: "Europe/Lisbon".to_string(),
            },
            professional: Professional {
                role: "Engineer".to_string(),
                team: team.to_string(),
                start_date: "2020-01-06".to_string(),
                reports_to: reports_to.to_string(),
                workload: "balanced".to_string(),
            },
            personal_life: PersonalLife {
                marital_status: "married".to_string(),
                hobbies: vec!["running".to_string()],
                gym_member: false,
                travel_frequency: "rarely".to_string(),
            },
        }
    }

    fn profiles() -> Vec<UserProfile> {
        vec![
            profile("Marta Kowalski", "Leadership", ""),
            profile("Daniel Okafor", "Platform", "Marta Kowalski"),
            profile("Ravi Menon", "Platform", "Daniel Okafor"),
            profile("Elena Petrova", "Platform", "Daniel Okafor"),
        ]
    }

    fn event(organizer: i64, title: &str, calendar: &str) -> Event {
        let start = NaiveDate::from_ymd_opt(2024, 3, 11)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        Event {
            user_id: organizer,
            title: title.to_string(),
            description: None,
            start_time: Some(start),
            end_time: Some(start + Duration::minutes(30)),
            location: None,
            all_day: false,
            calendar_id: calendar.to_string(),
            rrule: None,
            duration_minutes: None,
            exdates: Vec::new(),
            created_at: start - Duration::days(14),
            updated_at: start - Duration::days(14),
        }
    }

    fn cfg() -> GenerateConfig {
        GenerateConfig::for_window(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn standup_pulls_in_the_team() {
        let events = vec![event(3, "Daily Standup", "user_3_work")];
        let rows = assign_attendees(&events, &profiles(), &cfg(), 11);
        let ids: Vec<i64> = rows.iter().map(|row| row.user_id).collect();
        assert!(ids.contains(&2) && ids.contains(&3) && ids.contains(&4));
        assert!(!ids.contains(&1));
        assert_eq!(ids[0], 3);
    }

    #[test]
    fn one_on_one_is_organizer_plus_manager() {
        let events = vec![event(3, "1:1 with Manager", "user_3_work")];
        let rows = assign_attendees(&events, &profiles(), &cfg(), 11);
        let ids: Vec<i64> = rows.iter().map(|row| row.user_id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn all_hands_pulls_in_everyone() {
        let events = vec![event(1, "All Hands", "user_1_work")];
        let rows = assign_attendees(&events, &profiles(), &cfg(), 11);
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn personal_events_keep_only_the_organizer() {
        let events = vec![event(2, "Dentist Appointment", "user_2_personal")];
        let rows = assign_attendees(&events, &profiles(), &cfg(), 11);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, 2);
    }

    #[test]
    fn recurring_instances_are_deduplicated_by_title() {
        let events = vec![
            event(3, "Daily Standup", "user_3_work"),
            event(3, "Daily Standup", "user_3_work"),
        ];
        let rows = assign_attendees(&events, &profiles(), &cfg(), 11);
        let standups = rows
            .iter()
            .filter(|row| row.user_id == 3)
            .count();
        assert_eq!(standups, 1);
    }

    #[test]
    fn organizer_accepts_and_responses_sit_inside_the_window() {
        let events = vec![event(3, "Sprint Planning", "user_3_work")];
        let rows = assign_attendees(&events, &profiles(), &cfg(), 11);
        assert_eq!(rows[0].status, RsvpStatus::Accepted);
        for row in &rows {
            match row.responded_at {
                Some(responded) => {
                    assert!(row.status.is_responded());
                    assert!(responded > events[0].created_at);
                    assert!(responded < events[0].start_time.unwrap());
                }
                None => assert!(!row.status.is_responded()),
            }
        }
    }

    #[test]
    fn assignment_is_deterministic_per_seed() {
        let events = vec![
            event(2, "Team Meeting", "user_2_work"),
            event(3, "Code Review Session", "user_3_work"),
        ];
        let first = assign_attendees(&events, &profiles(), &cfg(), 21);
        let second = assign_attendees(&events, &profiles(), &cfg(), 21);
        assert_eq!(first, second);
    }
}
