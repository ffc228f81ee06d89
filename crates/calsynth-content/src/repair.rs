use regex::Regex;
use serde_json::Value;

/// Zero-pad sloppy ISO datetimes (`2024-2-5T9:00:00` → `2024-02-05T09:00:00`).
/// Anything that does not look like a date passes through unchanged.
pub fn fix_datetime(value: &str) -> String {
    let Ok(re) =
        Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2}))?)?$")
    else {
        return value.to_string();
    };
    let Some(caps) = re.captures(value.trim()) else {
        return value.to_string();
    };

    let year = &caps[1];
    let month: u32 = caps[2].parse().unwrap_or(1);
    let day: u32 = caps[3].parse().unwrap_or(1);
    match caps.get(4) {
        None => format!("{year}-{month:02}-{day:02}"),
        Some(hour) => {
            let hour: u32 = hour.as_str().parse().unwrap_or(0);
            let minute = &caps[5];
            let second = caps.get(6).map(|m| m.as_str()).unwrap_or("00");
            format!("{year}-{month:02}-{day:02}T{hour:02}:{minute}:{second}")
        }
    }
}

/// In-place repair of a parsed personal-events completion: null recurrence
/// rules become empty strings and datetime fields are zero-padded. Runs
/// before schema validation so well-known model quirks do not fail the
/// whole record.
pub fn repair_events_value(value: &mut Value) {
    let Some(events) = value
        .get_mut("personal_events")
        .and_then(|events| events.as_array_mut())
    else {
        return;
    };

    for event in events {
        let Some(object) = event.as_object_mut() else {
            continue;
        };
        if object
            .get("recurrence_rule")
            .is_some_and(|rule| rule.is_null())
        {
            object.insert("recurrence_rule".to_string(), Value::String(String::new()));
        }
        for field in ["start_time", "end_time"] {
            if let Some(Value::String(text)) = object.get(field) {
                let fixed = fix_datetime(text);
                if fixed != *text {
                    object.insert(field.to_string(), Value::String(fixed));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_months_days_and_hours() {
        assert_eq!(fix_datetime("2024-2-5T9:30:00"), "2024-02-05T09:30:00");
        assert_eq!(fix_datetime("2024-02-05T18:30"), "2024-02-05T18:30:00");
        assert_eq!(fix_datetime("2024-2-5"), "2024-02-05");
    }

    #[test]
    fn leaves_clean_and_foreign_strings_alone() {
        assert_eq!(fix_datetime("2024-02-05T18:30:00"), "2024-02-05T18:30:00");
        assert_eq!(fix_datetime("next friday"), "next friday");
    }

    #[test]
    fn repairs_null_rrule_and_dates_in_place() {
        let mut value = serde_json::json!({"personal_events": [{
            "title": "Gym",
            "description": "",
            "start_time": "2024-3-4T7:00:00",
            "end_time": "2024-3-4T8:00:00",
            "location": "Gym",
            "is_all_day": false,
            "recurrence_rule": null
        }]});
        repair_events_value(&mut value);
        let event = &value["personal_events"][0];
        assert_eq!(event["recurrence_rule"], "");
        assert_eq!(event["start_time"], "2024-03-04T07:00:00");
    }
}
