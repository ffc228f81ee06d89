use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use fake::Fake;
use fake::faker::address::en::CityName;
use fake::faker::phone_number::en::PhoneNumber;
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use calsynth_core::{OrgPerson, Personal, PersonalEventDraft, PersonalLife, Professional, UserProfile};
use calsynth_generate::rng::sub_rng;

use crate::errors::ContentError;
use crate::provider::ContentProvider;

const PRONOUNS: &[&str] = &["she/her", "he/him", "they/them"];
const TIMEZONES: &[&str] = &[
    "America/New_York",
    "America/Los_Angeles",
    "Europe/Lisbon",
    "Europe/Berlin",
    "Asia/Tokyo",
];
const WORKLOADS: &[&str] = &["light", "balanced", "heavy"];
const MARITAL: &[&str] = &["single", "married", "partnered"];
const TRAVEL: &[&str] = &["rarely", "quarterly", "monthly"];
const HOBBIES: &[&str] = &[
    "running",
    "climbing",
    "photography",
    "cooking",
    "board games",
    "cycling",
    "pottery",
    "guitar",
    "yoga",
    "hiking",
];

/// Deterministic offline provider: same seed and inputs, same content.
/// Stands in for the external endpoint in tests and network-free runs.
pub struct StubProvider {
    seed: u64,
    window_start: NaiveDate,
    window_end: NaiveDate,
}

impl StubProvider {
    pub fn new(seed: u64, window_start: NaiveDate, window_end: NaiveDate) -> Self {
        Self {
            seed,
            window_start,
            window_end,
        }
    }

    fn first_on_or_after(&self, weekday: Weekday) -> NaiveDate {
        let mut date = self.window_start;
        while date.weekday() != weekday {
            date += Duration::days(1);
        }
        date.min(self.window_end)
    }

    fn one_shot_day(&self, rng: &mut ChaCha8Rng, weekday: Weekday) -> NaiveDate {
        let anchor = self.first_on_or_after(weekday);
        let weeks_available = ((self.window_end - anchor).num_days() / 7).max(0);
        let week = if weeks_available > 0 {
            rng.random_range(0..=weeks_available)
        } else {
            0
        };
        anchor + Duration::weeks(week)
    }
}

#[async_trait]
impl ContentProvider for StubProvider {
    async fn generate_profile(&self, person: &OrgPerson) -> Result<UserProfile, ContentError> {
        let mut rng = sub_rng(self.seed, &format!("profile.{}", person.email));

        let age: u8 = rng.random_range(26..=58);
        let birth_year = 2024 - age as i32;
        let birthday = format!(
            "{birth_year}-{:02}-{:02}",
            rng.random_range(1..=12),
            rng.random_range(1..=28)
        );
        let start_date = format!(
            "{}-{:02}-{:02}",
            rng.random_range(2016..=2022),
            rng.random_range(1..=12),
            rng.random_range(1..=28)
        );

        let hobby_count = rng.random_range(2..=3);
        let hobbies: Vec<String> = HOBBIES
            .choose_multiple(&mut rng, hobby_count)
            .map(|hobby| hobby.to_string())
            .collect();

        Ok(UserProfile {
            personal: Personal {
                name: person.full_name(),
                email: person.email.clone(),
                age,
                pronouns: pick(&mut rng, PRONOUNS),
                birthday,
                phone: PhoneNumber().fake_with_rng(&mut rng),
                city: CityName().fake_with_rng(&mut rng),
                timezone: pick(&mut rng, TIMEZONES),
            },
            professional: Professional {
                role: person.position.clone(),
                team: person.team.clone(),
                start_date,
                reports_to: person.reports_to.clone(),
                workload: pick(&mut rng, WORKLOADS),
            },
            personal_life: PersonalLife {
                marital_status: pick(&mut rng, MARITAL),
                hobbies,
                gym_member: rng.random_bool(0.6),
                travel_frequency: pick(&mut rng, TRAVEL),
            },
        })
    }

    async fn generate_personal_events(
        &self,
        profile: &UserProfile,
        _work_schedule: &str,
    ) -> Result<Vec<PersonalEventDraft>, ContentError> {
        let mut rng = sub_rng(self.seed, &format!("personal.{}", profile.personal.email));
        let mut drafts = Vec::new();

        for (index, hobby) in profile.personal_life.hobbies.iter().take(2).enumerate() {
            let weekday = if index == 0 { Weekday::Sat } else { Weekday::Tue };
            let hour = if weekday == Weekday::Sat { 10 } else { 19 };
            let date = self.first_on_or_after(weekday);
            let minutes = rng.random_range(2..=3) * 30;
            drafts.push(draft(
                format!("{} session", capitalize(hobby)),
                format!("Regular {hobby} practice."),
                date,
                hour,
                0,
                minutes,
                false,
                format!("FREQ=WEEKLY;BYDAY={}", weekday_code(weekday)),
                "Community center",
            ));
        }

        if profile.personal_life.gym_member {
            let date = self.first_on_or_after(Weekday::Thu);
            drafts.push(draft(
                "Gym Session".to_string(),
                "Strength training.".to_string(),
                date,
                18,
                30,
                60,
                false,
                format!("FREQ=WEEKLY;BYDAY={}", weekday_code(Weekday::Thu)),
                "Local gym",
            ));
        }

        let dentist = self.one_shot_day(&mut rng, Weekday::Wed);
        drafts.push(draft(
            "Dentist Appointment".to_string(),
            "Routine checkup.".to_string(),
            dentist,
            8,
            30,
            45,
            false,
            String::new(),
            "Dental clinic",
        ));

        let dinner = self.one_shot_day(&mut rng, Weekday::Fri);
        drafts.push(draft(
            "Dinner with Friends".to_string(),
            "Catching up over dinner.".to_string(),
            dinner,
            19,
            30,
            120,
            false,
            String::new(),
            "Downtown",
        ));

        let day_off = self.one_shot_day(&mut rng, Weekday::Mon);
        drafts.push(PersonalEventDraft {
            title: "Day Off".to_string(),
            description: "Personal time off.".to_string(),
            start_time: format!("{day_off}T00:00:00"),
            end_time: format!("{}T00:00:00", day_off + Duration::days(1)),
            location: String::new(),
            is_all_day: true,
            recurrence_rule: String::new(),
        });

        Ok(drafts)
    }
}

fn pick(rng: &mut ChaCha8Rng, values: &[&str]) -> String {
    values.choose(rng).copied().unwrap_or_default().to_string()
}

#[allow(clippy::too_many_arguments)]
fn draft(
    title: String,
    description: String,
    date: NaiveDate,
    hour: u32,
    minute: u32,
    duration_minutes: i64,
    is_all_day: bool,
    recurrence_rule: String,
    location: &str,
) -> PersonalEventDraft {
    let start = date.and_hms_opt(hour, minute, 0).unwrap_or_default();
    let end = start + Duration::minutes(duration_minutes);
    PersonalEventDraft {
        title,
        description,
        start_time: start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        end_time: end.format("%Y-%m-%dT%H:%M:%S").to_string(),
        location: location.to_string(),
        is_all_day,
        recurrence_rule,
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn weekday_code(day: Weekday) -> &'static str {
    calsynth_generate::seeds::weekday_code(day)
}
