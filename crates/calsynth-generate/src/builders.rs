use chrono::{NaiveDate, NaiveDateTime};

use calsynth_core::{Calendar, CalendarKind, CalendarShare, User, UserProfile, calendar_id};

use crate::errors::GenerateError;

const PERSONAL_COLOR: &str = "#34a853";
const WORK_COLOR: &str = "#4285f4";
const TEXT_COLOR: &str = "#ffffff";

/// Build the users table from generated profiles. Ids are positional
/// (1-based) and must stay aligned with the profile slice everywhere else
/// in the pipeline.
pub fn build_users(
    profiles: &[UserProfile],
    generated_at: NaiveDateTime,
) -> Result<Vec<User>, GenerateError> {
    profiles
        .iter()
        .enumerate()
        .map(|(index, profile)| {
            let created_at = parse_start_date(&profile.professional.start_date)?;
            Ok(User {
                id: index as i64 + 1,
                email: profile.personal.email.clone(),
                name: profile.personal.name.clone(),
                created_at,
                updated_at: generated_at,
            })
        })
        .collect()
}

/// Every user gets a Personal and a Work calendar with fixed display
/// colors.
pub fn build_calendars(users: &[User], generated_at: NaiveDateTime) -> Vec<Calendar> {
    let mut calendars = Vec::with_capacity(users.len() * 2);
    for user in users {
        for (kind, color) in [
            (CalendarKind::Personal, PERSONAL_COLOR),
            (CalendarKind::Work, WORK_COLOR),
        ] {
            calendars.push(Calendar {
                id: calendar_id(user.id, kind),
                name: kind.display_name().to_string(),
                color: color.to_string(),
                text_color: TEXT_COLOR.to_string(),
                owner_id: user.id,
                created_at: user.created_at,
                updated_at: generated_at,
            });
        }
    }
    calendars
}

/// Share each user's work calendar view-only with their manager.
pub fn build_shares(
    users: &[User],
    profiles: &[UserProfile],
    generated_at: NaiveDateTime,
) -> Vec<CalendarShare> {
    let mut shares = Vec::new();
    for (user, profile) in users.iter().zip(profiles) {
        let manager = &profile.professional.reports_to;
        if manager.is_empty() {
            continue;
        }
        let Some(manager_id) = users
            .iter()
            .find(|candidate| candidate.name == *manager)
            .map(|candidate| candidate.id)
        else {
            continue;
        };
        shares.push(CalendarShare {
            calendar_id: calendar_id(user.id, CalendarKind::Work),
            shared_with_id: manager_id,
            can_view: true,
            can_edit: false,
            can_delete: false,
            can_share: false,
            created_at: generated_at,
        });
    }
    shares
}

fn parse_start_date(value: &str) -> Result<NaiveDateTime, GenerateError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(9, 0, 0).unwrap_or_default());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map_err(|_| {
        GenerateError::InvalidDatetime {
            field: "professional.start_date".to_string(),
            value: value.to_string(),
        }
    })
}
