use serde::{Deserialize, Serialize};

use crate::records::{Attendee, Calendar, CalendarShare, Event, User};

/// The in-memory bundle of all generated tables, passed between pipeline
/// steps and serialized into checkpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub users: Vec<User>,
    pub calendars: Vec<Calendar>,
    pub shares: Vec<CalendarShare>,
    pub events: Vec<Event>,
    pub attendees: Vec<Attendee>,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub users: usize,
    pub calendars: usize,
    pub shares: usize,
    pub events: usize,
    pub attendees: usize,
}

impl Dataset {
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            users: self.users.len(),
            calendars: self.calendars.len(),
            shares: self.shares.len(),
            events: self.events.len(),
            attendees: self.attendees.len(),
        }
    }

    pub fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn calendar(&self, id: &str) -> Option<&Calendar> {
        self.calendars.iter().find(|calendar| calendar.id == id)
    }
}
