use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use calsynth_core::{Dataset, RsvpStatus, validate_dataset};

use crate::config::GenerateConfig;

/// Outcome of one advisory data-quality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Post-hoc data-quality report. Advisory only: failures are reported,
/// never auto-corrected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|result| result.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|result| !result.passed)
    }

    fn push(&mut self, name: &str, passed: bool, detail: impl Into<String>) {
        self.results.push(CheckResult {
            name: name.to_string(),
            passed,
            detail: detail.into(),
        });
    }
}

/// Run every advisory check against a generated dataset.
pub fn run_checks(dataset: &Dataset, cfg: &GenerateConfig) -> CheckReport {
    let mut report = CheckReport {
        results: Vec::new(),
    };

    let counts = dataset.counts();
    report.push(
        "row_counts",
        counts.users > 0 && counts.calendars > 0 && counts.events > 0 && counts.attendees > 0,
        format!(
            "{} users, {} calendars, {} shares, {} events, {} attendees",
            counts.users, counts.calendars, counts.shares, counts.events, counts.attendees
        ),
    );

    report.push(
        "calendars_per_user",
        counts.calendars == counts.users * 2,
        format!("{} calendars for {} users", counts.calendars, counts.users),
    );

    let issues = validate_dataset(dataset);
    report.push(
        "structural_validity",
        issues.is_empty(),
        if issues.is_empty() {
            "no structural issues".to_string()
        } else {
            let sample: Vec<String> = issues
                .iter()
                .take(3)
                .map(|issue| format!("{}[{}]: {}", issue.table, issue.row, issue.message))
                .collect();
            format!("{} issue(s), e.g. {}", issues.len(), sample.join("; "))
        },
    );

    check_distribution(dataset, cfg, &mut report);

    let events_per_user = if counts.users > 0 {
        counts.events as f64 / counts.users as f64
    } else {
        0.0
    };
    report.push(
        "events_per_user",
        events_per_user >= 1.0,
        format!("{events_per_user:.1} events per user"),
    );

    report
}

/// Non-organizer RSVP shares must sit inside the envelope spanned by the
/// required and optional weight tables, widened by the configured
/// tolerance.
fn check_distribution(dataset: &Dataset, cfg: &GenerateConfig, report: &mut CheckReport) {
    let mut totals: HashMap<RsvpStatus, usize> = HashMap::new();
    let mut observed = 0_usize;
    for attendee in &dataset.attendees {
        if attendee.user_id == attendee.event_user_id {
            continue;
        }
        *totals.entry(attendee.status).or_default() += 1;
        observed += 1;
    }

    if observed < 20 {
        report.push(
            "rsvp_distribution",
            true,
            format!("only {observed} non-organizer rows, distribution not assessed"),
        );
        return;
    }

    let required_total = cfg.required_weights.total();
    let optional_total = cfg.optional_weights.total();
    let expectations = [
        (
            RsvpStatus::Accepted,
            cfg.required_weights.accepted / required_total,
            cfg.optional_weights.accepted / optional_total,
        ),
        (
            RsvpStatus::Declined,
            cfg.required_weights.declined / required_total,
            cfg.optional_weights.declined / optional_total,
        ),
        (
            RsvpStatus::Tentative,
            cfg.required_weights.tentative / required_total,
            cfg.optional_weights.tentative / optional_total,
        ),
        (
            RsvpStatus::NoResponse,
            cfg.required_weights.no_response / required_total,
            cfg.optional_weights.no_response / optional_total,
        ),
    ];

    let mut passed = true;
    let mut details = Vec::new();
    for (status, required_share, optional_share) in expectations {
        // Pending rows come from responses that could not be scheduled and
        // count against the unresponded bucket.
        let mut count = totals.get(&status).copied().unwrap_or(0);
        if status == RsvpStatus::NoResponse {
            count += totals.get(&RsvpStatus::Pending).copied().unwrap_or(0);
        }
        let share = count as f64 / observed as f64;
        let low = required_share.min(optional_share) - cfg.distribution_tolerance;
        let high = required_share.max(optional_share) + cfg.distribution_tolerance;
        if share < low || share > high {
            passed = false;
        }
        details.push(format!("{status}={share:.2}"));
    }

    report.push("rsvp_distribution", passed, details.join(", "));
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use calsynth_core::{Attendee, Calendar, CalendarKind, Event, User, calendar_id};

    use super::*;

    fn cfg() -> GenerateConfig {
        GenerateConfig::for_window(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        )
    }

    fn dataset() -> Dataset {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let user = User {
            id: 1,
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            created_at: ts,
            updated_at: ts,
        };
        let calendars = vec![
            Calendar {
                id: calendar_id(1, CalendarKind::Personal),
                name: "Personal".to_string(),
                color: "#34a853".to_string(),
                text_color: "#ffffff".to_string(),
                owner_id: 1,
                created_at: ts,
                updated_at: ts,
            },
            Calendar {
                id: calendar_id(1, CalendarKind::Work),
                name: "Work".to_string(),
                color: "#4285f4".to_string(),
                text_color: "#ffffff".to_string(),
                owner_id: 1,
                created_at: ts,
                updated_at: ts,
            },
        ];
        let event = Event {
            user_id: 1,
            title: "Team Meeting".to_string(),
            description: None,
            start_time: Some(ts + chrono::Duration::days(7)),
            end_time: Some(ts + chrono::Duration::days(7) + chrono::Duration::hours(1)),
            location: None,
            all_day: false,
            calendar_id: calendar_id(1, CalendarKind::Work),
            rrule: None,
            duration_minutes: None,
            exdates: Vec::new(),
            created_at: ts,
            updated_at: ts,
        };
        let attendee = Attendee {
            user_id: 1,
            event_user_id: 1,
            event_title: "Team Meeting".to_string(),
            event_start_time: event.start_time,
            event_end_time: event.end_time,
            status: calsynth_core::RsvpStatus::Accepted,
            responded_at: Some(ts + chrono::Duration::days(1)),
        };
        Dataset {
            users: vec![user],
            calendars,
            shares: Vec::new(),
            events: vec![event],
            attendees: vec![attendee],
        }
    }

    #[test]
    fn clean_dataset_passes_all_checks() {
        let report = run_checks(&dataset(), &cfg());
        assert!(report.passed(), "failures: {:?}", report.failures().collect::<Vec<_>>());
    }

    #[test]
    fn missing_calendar_fails_the_per_user_check() {
        let mut data = dataset();
        data.calendars.pop();
        let report = run_checks(&data, &cfg());
        assert!(!report.passed());
        assert!(
            report
                .failures()
                .any(|failure| failure.name == "calendars_per_user")
        );
    }

    #[test]
    fn small_samples_skip_distribution_judgment() {
        let report = run_checks(&dataset(), &cfg());
        let distribution = report
            .results
            .iter()
            .find(|result| result.name == "rsvp_distribution")
            .unwrap();
        assert!(distribution.passed);
        assert!(distribution.detail.contains("not assessed"));
    }
}
