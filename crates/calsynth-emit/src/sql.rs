use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

use calsynth_core::{Attendee, Dataset, RsvpStatus, SqlDialect, StatusPolicy};

use crate::errors::EmitError;

/// Renders a dataset as a batched INSERT script for one SQL dialect.
///
/// Every datetime column is emitted as an expression relative to the
/// `@TODAY` variable using the value's signed day offset from the
/// emitter's base date, so cross-column ordering survives replay at any
/// date. `@session_id` tags every row with the load session.
pub struct SqlEmitter {
    dialect: SqlDialect,
    today: NaiveDate,
    policy: StatusPolicy,
}

impl SqlEmitter {
    pub fn new(dialect: SqlDialect, today: NaiveDate, policy: StatusPolicy) -> Self {
        Self {
            dialect,
            today,
            policy,
        }
    }

    pub fn emit(&self, dataset: &Dataset) -> Result<String, EmitError> {
        let mut out = String::new();

        out.push_str(&format!(
            "-- Calendar data ({} dialect)\n-- Base date for relative datetimes: {}\n",
            self.dialect, self.today
        ));
        out.push_str("-- Variables: @TODAY (date literal), @session_id (text literal)\n\n");

        if self.dialect == SqlDialect::MySql {
            // MySQL resolves the variables natively; callers override the
            // defaults by rewriting these two lines.
            out.push_str(&format!("SET @TODAY = '{}';\n", self.today));
            out.push_str("SET @session_id = 'session_123';\n\n");
        }

        out.push_str("-- USERS\n");
        for user in &dataset.users {
            out.push_str(&format!(
                "INSERT INTO users (email, name, created_at, updated_at, session_id) \
                 VALUES ({}, {}, {}, {}, @session_id);\n",
                self.text(&user.email),
                self.text(&user.name),
                self.datetime_expr(user.created_at),
                self.datetime_expr(user.updated_at),
            ));
        }

        out.push_str("\n-- CALENDARS\n");
        for calendar in &dataset.calendars {
            out.push_str(&format!(
                "INSERT INTO calendars (id, name, color, text_color, owner_id, created_at, \
                 updated_at, session_id) VALUES ({}, {}, {}, {}, {}, {}, {}, @session_id);\n",
                self.text(&calendar.id),
                self.text(&calendar.name),
                self.text(&calendar.color),
                self.text(&calendar.text_color),
                calendar.owner_id,
                self.datetime_expr(calendar.created_at),
                self.datetime_expr(calendar.updated_at),
            ));
        }

        out.push_str("\n-- CALENDAR SHARES\n");
        for share in &dataset.shares {
            out.push_str(&format!(
                "INSERT INTO calendar_shares (calendar_id, shared_with_id, can_view, can_edit, \
                 can_delete, can_share, created_at, session_id) \
                 VALUES ({}, {}, {}, {}, {}, {}, {}, @session_id);\n",
                self.text(&share.calendar_id),
                share.shared_with_id,
                self.bool_lit(share.can_view),
                self.bool_lit(share.can_edit),
                self.bool_lit(share.can_delete),
                self.bool_lit(share.can_share),
                self.datetime_expr(share.created_at),
            ));
        }

        out.push_str("\n-- EVENTS\n");
        for event in &dataset.events {
            let exdate = if event.exdates.is_empty() {
                "NULL".to_string()
            } else {
                self.text(&serde_json::to_string(&event.exdates)?)
            };
            out.push_str(&format!(
                "INSERT INTO events (user_id, title, description, start_time, end_time, location, \
                 all_day, calendar_id, rrule, duration, exdate, created_at, updated_at, session_id) \
                 VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, @session_id);\n",
                event.user_id,
                self.text(&event.title),
                self.opt_text(event.description.as_deref()),
                self.opt_datetime(event.start_time),
                self.opt_datetime(event.end_time),
                self.opt_text(event.location.as_deref()),
                self.bool_lit(event.all_day),
                self.text(&event.calendar_id),
                self.opt_text(event.rrule.as_deref()),
                event
                    .duration_minutes
                    .map(|minutes| minutes.to_string())
                    .unwrap_or_else(|| "NULL".to_string()),
                exdate,
                self.datetime_expr(event.created_at),
                self.datetime_expr(event.updated_at),
            ));
        }

        // Events receive autoincrement ids at load time; attendees resolve
        // them through a temporary mapping table, matching on organizer and
        // title.
        out.push_str("\n-- EVENT MAPPING\n");
        out.push_str(
            "CREATE TEMPORARY TABLE event_mapping AS \
             SELECT id AS event_id, user_id, title FROM events ORDER BY id;\n",
        );

        out.push_str("\n-- ATTENDEES\n");
        for attendee in &dataset.attendees {
            let (status, responded_at) = self.attendee_status(attendee)?;
            out.push_str(&format!(
                "INSERT INTO attendees (event_id, user_id, status, responded_at, session_id) \
                 SELECT em.event_id, {}, {}, {}, @session_id FROM event_mapping em \
                 WHERE em.user_id = {} AND em.title = {} ORDER BY em.event_id LIMIT 1;\n",
                attendee.user_id,
                self.text(status.as_str()),
                self.opt_datetime(responded_at),
                attendee.event_user_id,
                self.text(&attendee.event_title),
            ));
        }

        Ok(out)
    }

    /// Status as storable in the target schema. The SQLite variant only
    /// accepts the three-value subset; out-of-subset values are coerced to
    /// `pending` (clearing the response timestamp) or rejected, per policy.
    fn attendee_status(
        &self,
        attendee: &Attendee,
    ) -> Result<(RsvpStatus, Option<NaiveDateTime>), EmitError> {
        if self.dialect.supports_full_status_enum()
            || RsvpStatus::sqlite_subset().contains(&attendee.status)
        {
            return Ok((attendee.status, attendee.responded_at));
        }
        match self.policy {
            StatusPolicy::Reject => Err(EmitError::UnsupportedStatus {
                status: attendee.status,
                dialect: self.dialect,
            }),
            StatusPolicy::Coerce => {
                let coerced = attendee.status.coerced_for_sqlite();
                warn!(
                    from = %attendee.status,
                    to = %coerced,
                    user_id = attendee.user_id,
                    title = %attendee.event_title,
                    "coercing attendee status for the sqlite schema"
                );
                let responded_at = if coerced.is_responded() {
                    attendee.responded_at
                } else {
                    None
                };
                Ok((coerced, responded_at))
            }
        }
    }

    fn datetime_expr(&self, value: NaiveDateTime) -> String {
        let offset = (value.date() - self.today).num_days();
        let time = value.format("%H:%M:%S");
        match self.dialect {
            SqlDialect::Sqlite => {
                let sign = if offset < 0 { "-" } else { "+" };
                format!("datetime(@TODAY, '{sign}{} days', '{time}')", offset.abs())
            }
            SqlDialect::MySql => format!(
                "DATE_ADD(DATE_ADD(@TODAY, INTERVAL {offset} DAY), INTERVAL '{time}' HOUR_SECOND)"
            ),
        }
    }

    fn opt_datetime(&self, value: Option<NaiveDateTime>) -> String {
        value
            .map(|value| self.datetime_expr(value))
            .unwrap_or_else(|| "NULL".to_string())
    }

    fn text(&self, value: &str) -> String {
        let escaped = match self.dialect {
            SqlDialect::Sqlite => value.replace('\'', "''"),
            SqlDialect::MySql => value.replace('\\', "\\\\").replace('\'', "''"),
        };
        format!("'{escaped}'")
    }

    fn opt_text(&self, value: Option<&str>) -> String {
        match value {
            Some(value) if !value.is_empty() => self.text(value),
            _ => "NULL".to_string(),
        }
    }

    fn bool_lit(&self, value: bool) -> &'static str {
        match (self.dialect, value) {
            (SqlDialect::Sqlite, true) => "1",
            (SqlDialect::Sqlite, false) => "0",
            (SqlDialect::MySql, true) => "TRUE",
            (SqlDialect::MySql, false) => "FALSE",
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use calsynth_core::{Calendar, CalendarKind, Event, User, calendar_id};

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn dataset() -> Dataset {
        let created = today().and_hms_opt(9, 0, 0).unwrap() - Duration::days(20);
        let start = today().and_hms_opt(9, 30, 0).unwrap() + Duration::days(3);
        let user = User {
            id: 1,
            email: "ana@example.com".to_string(),
            name: "Ana O'Neil".to_string(),
            created_at: created,
            updated_at: created,
        };
        let calendar = Calendar {
            id: calendar_id(1, CalendarKind::Work),
            name: "Work".to_string(),
            color: "#4285f4".to_string(),
            text_color: "#ffffff".to_string(),
            owner_id: 1,
            created_at: created,
            updated_at: created,
        };
        let event = Event {
            user_id: 1,
            title: "Sprint Planning".to_string(),
            description: Some("Plan the sprint".to_string()),
            start_time: Some(start),
            end_time: Some(start + Duration::minutes(90)),
            location: Some("Room C".to_string()),
            all_day: false,
            calendar_id: calendar.id.clone(),
            rrule: Some("RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=TU".to_string()),
            duration_minutes: None,
            exdates: vec![today() + Duration::days(17)],
            created_at: created,
            updated_at: created,
        };
        let attendee = Attendee {
            user_id: 1,
            event_user_id: 1,
            event_title: "Sprint Planning".to_string(),
            event_start_time: event.start_time,
            event_end_time: event.end_time,
            status: RsvpStatus::Accepted,
            responded_at: Some(created + Duration::days(2)),
        };
        Dataset {
            users: vec![user],
            calendars: vec![calendar],
            shares: Vec::new(),
            events: vec![event],
            attendees: vec![attendee],
        }
    }

    #[test]
    fn sqlite_uses_datetime_modifiers_and_numeric_booleans() {
        let emitter = SqlEmitter::new(SqlDialect::Sqlite, today(), StatusPolicy::Coerce);
        let script = emitter.emit(&dataset()).unwrap();
        assert!(script.contains("datetime(@TODAY, '+3 days', '09:30:00')"));
        assert!(script.contains("datetime(@TODAY, '-20 days', '09:00:00')"));
        assert!(script.contains(", 0, 'user_1_work'"));
        assert!(!script.contains("SET @TODAY"));
    }

    #[test]
    fn mysql_uses_date_add_and_boolean_keywords() {
        let emitter = SqlEmitter::new(SqlDialect::MySql, today(), StatusPolicy::Coerce);
        let script = emitter.emit(&dataset()).unwrap();
        assert!(script.contains("DATE_ADD(DATE_ADD(@TODAY, INTERVAL 3 DAY), INTERVAL '09:30:00' HOUR_SECOND)"));
        assert!(script.contains("DATE_ADD(DATE_ADD(@TODAY, INTERVAL -20 DAY), INTERVAL '09:00:00' HOUR_SECOND)"));
        assert!(script.contains(", FALSE, 'user_1_work'"));
        assert!(script.starts_with("-- Calendar data (mysql dialect)"));
        assert!(script.contains("SET @TODAY = '2024-01-15';"));
    }

    #[test]
    fn quotes_are_escaped_per_dialect() {
        let emitter = SqlEmitter::new(SqlDialect::Sqlite, today(), StatusPolicy::Coerce);
        let script = emitter.emit(&dataset()).unwrap();
        assert!(script.contains("'Ana O''Neil'"));
    }

    #[test]
    fn attendees_resolve_event_ids_through_the_mapping_table() {
        let emitter = SqlEmitter::new(SqlDialect::Sqlite, today(), StatusPolicy::Coerce);
        let script = emitter.emit(&dataset()).unwrap();
        assert!(script.contains("CREATE TEMPORARY TABLE event_mapping"));
        assert!(script.contains("WHERE em.user_id = 1 AND em.title = 'Sprint Planning'"));
    }

    #[test]
    fn tentative_is_coerced_for_sqlite_and_kept_for_mysql() {
        let mut data = dataset();
        data.attendees[0].status = RsvpStatus::Tentative;

        let sqlite = SqlEmitter::new(SqlDialect::Sqlite, today(), StatusPolicy::Coerce)
            .emit(&data)
            .unwrap();
        assert!(sqlite.contains("'pending', NULL"));
        assert!(!sqlite.contains("'tentative'"));

        let mysql = SqlEmitter::new(SqlDialect::MySql, today(), StatusPolicy::Coerce)
            .emit(&data)
            .unwrap();
        assert!(mysql.contains("'tentative'"));
    }

    #[test]
    fn reject_policy_fails_on_out_of_subset_statuses() {
        let mut data = dataset();
        data.attendees[0].status = RsvpStatus::NoResponse;
        let result =
            SqlEmitter::new(SqlDialect::Sqlite, today(), StatusPolicy::Reject).emit(&data);
        assert!(matches!(result, Err(EmitError::UnsupportedStatus { .. })));
    }

    #[test]
    fn exception_dates_serialize_as_json_text() {
        let emitter = SqlEmitter::new(SqlDialect::Sqlite, today(), StatusPolicy::Coerce);
        let script = emitter.emit(&dataset()).unwrap();
        assert!(script.contains(r#"'["2024-02-01"]'"#));
    }
}
