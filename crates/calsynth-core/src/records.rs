use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::status::RsvpStatus;

/// A generated account row. `id` is assigned positionally (1-based) and
/// matches the autoincrement ids the database hands out when the script is
/// loaded in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Calendar category; every user owns one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarKind {
    Work,
    Personal,
}

impl CalendarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarKind::Work => "work",
            CalendarKind::Personal => "personal",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CalendarKind::Work => "Work",
            CalendarKind::Personal => "Personal",
        }
    }
}

/// Text primary key for a user's calendar, e.g. `user_3_work`.
pub fn calendar_id(owner_id: i64, kind: CalendarKind) -> String {
    format!("user_{owner_id}_{}", kind.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
    pub color: String,
    pub text_color: String,
    pub owner_id: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Calendar {
    /// Kind recovered from the id suffix. Unrecognized ids are treated as
    /// work calendars, matching how the audience rules fall back.
    pub fn kind(&self) -> CalendarKind {
        if self.id.ends_with("_personal") {
            CalendarKind::Personal
        } else {
            CalendarKind::Work
        }
    }
}

/// Non-owner access to a calendar, keyed by `(calendar_id, shared_with_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarShare {
    pub calendar_id: String,
    pub shared_with_id: i64,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_share: bool,
    pub created_at: NaiveDateTime,
}

/// A concrete or recurring calendar event.
///
/// `start_time`/`end_time` are nullable for recurring templates that only
/// carry an rrule; `exdates` holds occurrence dates excluded from the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub all_day: bool,
    pub calendar_id: String,
    pub rrule: Option<String>,
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub exdates: Vec<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// An attendee row. Events have no stable ids until the script is loaded,
/// so the row carries the organizer id and title/time tuple used to resolve
/// the event id at emission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub user_id: i64,
    pub event_user_id: i64,
    pub event_title: String,
    pub event_start_time: Option<NaiveDateTime>,
    pub event_end_time: Option<NaiveDateTime>,
    pub status: RsvpStatus,
    pub responded_at: Option<NaiveDateTime>,
}
