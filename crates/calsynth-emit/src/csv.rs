use std::path::Path;

use chrono::NaiveDateTime;

use calsynth_core::Dataset;

use crate::errors::EmitError;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write every table of the dataset into `dir` with a fixed column order.
/// The `session_id` column is left empty; it is resolved by the SQL script
/// at load time.
pub fn write_dataset_csv(dir: &Path, dataset: &Dataset) -> Result<(), EmitError> {
    std::fs::create_dir_all(dir)?;

    let mut users = csv::Writer::from_path(dir.join("users.csv"))?;
    users.write_record(["email", "name", "created_at", "updated_at", "session_id"])?;
    for user in &dataset.users {
        users.write_record([
            user.email.clone(),
            user.name.clone(),
            timestamp(user.created_at),
            timestamp(user.updated_at),
            String::new(),
        ])?;
    }
    users.flush()?;

    let mut calendars = csv::Writer::from_path(dir.join("calendars.csv"))?;
    calendars.write_record([
        "id",
        "name",
        "color",
        "text_color",
        "owner_id",
        "created_at",
        "updated_at",
        "session_id",
    ])?;
    for calendar in &dataset.calendars {
        calendars.write_record([
            calendar.id.clone(),
            calendar.name.clone(),
            calendar.color.clone(),
            calendar.text_color.clone(),
            calendar.owner_id.to_string(),
            timestamp(calendar.created_at),
            timestamp(calendar.updated_at),
            String::new(),
        ])?;
    }
    calendars.flush()?;

    let mut shares = csv::Writer::from_path(dir.join("calendar_shares.csv"))?;
    shares.write_record([
        "calendar_id",
        "shared_with_id",
        "can_view",
        "can_edit",
        "can_delete",
        "can_share",
        "created_at",
        "session_id",
    ])?;
    for share in &dataset.shares {
        shares.write_record([
            share.calendar_id.clone(),
            share.shared_with_id.to_string(),
            share.can_view.to_string(),
            share.can_edit.to_string(),
            share.can_delete.to_string(),
            share.can_share.to_string(),
            timestamp(share.created_at),
            String::new(),
        ])?;
    }
    shares.flush()?;

    let mut events = csv::Writer::from_path(dir.join("events.csv"))?;
    events.write_record([
        "user_id",
        "title",
        "description",
        "start_time",
        "end_time",
        "location",
        "all_day",
        "calendar_id",
        "rrule",
        "duration",
        "exdate",
        "created_at",
        "updated_at",
        "session_id",
    ])?;
    for event in &dataset.events {
        let exdate = if event.exdates.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&event.exdates)?
        };
        events.write_record([
            event.user_id.to_string(),
            event.title.clone(),
            event.description.clone().unwrap_or_default(),
            optional_timestamp(event.start_time),
            optional_timestamp(event.end_time),
            event.location.clone().unwrap_or_default(),
            event.all_day.to_string(),
            event.calendar_id.clone(),
            event.rrule.clone().unwrap_or_default(),
            event
                .duration_minutes
                .map(|minutes| minutes.to_string())
                .unwrap_or_default(),
            exdate,
            timestamp(event.created_at),
            timestamp(event.updated_at),
            String::new(),
        ])?;
    }
    events.flush()?;

    let mut attendees = csv::Writer::from_path(dir.join("attendees.csv"))?;
    attendees.write_record([
        "user_id",
        "event_user_id",
        "event_title",
        "event_start_time",
        "event_end_time",
        "status",
        "responded_at",
        "session_id",
    ])?;
    for attendee in &dataset.attendees {
        attendees.write_record([
            attendee.user_id.to_string(),
            attendee.event_user_id.to_string(),
            attendee.event_title.clone(),
            optional_timestamp(attendee.event_start_time),
            optional_timestamp(attendee.event_end_time),
            attendee.status.as_str().to_string(),
            optional_timestamp(attendee.responded_at),
            String::new(),
        ])?;
    }
    attendees.flush()?;

    Ok(())
}

fn timestamp(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

fn optional_timestamp(value: Option<NaiveDateTime>) -> String {
    value.map(timestamp).unwrap_or_default()
}
