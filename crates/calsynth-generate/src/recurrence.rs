use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;

use crate::errors::GenerateError;
use crate::seeds::parse_weekday;

/// Repeat frequency of a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// One `BYDAY` entry; the ordinal is only meaningful for monthly rules
/// (`1FR` = first Friday, `-1FR` = last Friday).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByDay {
    pub ordinal: Option<i8>,
    pub weekday: Weekday,
}

/// Parsed form of the RRULE subset this generator emits:
/// `FREQ=DAILY|WEEKLY|MONTHLY`, `INTERVAL`, `BYDAY` (with monthly
/// ordinals), `COUNT` and `UNTIL`. An optional `RRULE:` prefix is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    pub interval: u32,
    pub by_day: Vec<ByDay>,
    pub count: Option<u32>,
    pub until: Option<NaiveDate>,
}

impl RecurrenceRule {
    pub fn parse(input: &str) -> Result<Self, GenerateError> {
        let body = input.trim();
        let body = body.strip_prefix("RRULE:").unwrap_or(body);
        if body.is_empty() {
            return Err(invalid(input, "empty rule"));
        }

        let mut freq = None;
        let mut interval = 1_u32;
        let mut by_day = Vec::new();
        let mut count = None;
        let mut until = None;

        for part in body.split(';') {
            let Some((key, value)) = part.split_once('=') else {
                return Err(invalid(input, format!("malformed part '{part}'")));
            };
            match key {
                "FREQ" => {
                    freq = Some(match value {
                        "DAILY" => Frequency::Daily,
                        "WEEKLY" => Frequency::Weekly,
                        "MONTHLY" => Frequency::Monthly,
                        other => {
                            return Err(invalid(input, format!("unsupported FREQ '{other}'")));
                        }
                    });
                }
                "INTERVAL" => {
                    interval = value
                        .parse::<u32>()
                        .ok()
                        .filter(|parsed| *parsed >= 1)
                        .ok_or_else(|| invalid(input, format!("bad INTERVAL '{value}'")))?;
                }
                "BYDAY" => {
                    for entry in value.split(',') {
                        by_day.push(parse_by_day(entry).ok_or_else(|| {
                            invalid(input, format!("bad BYDAY entry '{entry}'"))
                        })?);
                    }
                }
                "COUNT" => {
                    count = Some(
                        value
                            .parse::<u32>()
                            .ok()
                            .filter(|parsed| *parsed >= 1)
                            .ok_or_else(|| invalid(input, format!("bad COUNT '{value}'")))?,
                    );
                }
                "UNTIL" => {
                    until = Some(parse_until(value).ok_or_else(|| {
                        invalid(input, format!("bad UNTIL '{value}'"))
                    })?);
                }
                other => {
                    return Err(invalid(input, format!("unsupported key '{other}'")));
                }
            }
        }

        let freq = freq.ok_or_else(|| invalid(input, "missing FREQ"))?;
        Ok(Self {
            freq,
            interval,
            by_day,
            count,
            until,
        })
    }

    /// Lazy occurrence stream starting at `dtstart`. Each call builds a
    /// fresh iterator, so expansion is restartable and idempotent.
    pub fn occurrences(&self, dtstart: NaiveDateTime) -> Occurrences<'_> {
        Occurrences::new(self, dtstart)
    }

    /// Concrete occurrences up to and including `horizon`, excluding
    /// exception dates. `COUNT` bounds the raw series before exdates are
    /// removed, so exdates reduce the returned length.
    pub fn expand(
        &self,
        dtstart: NaiveDateTime,
        horizon: NaiveDate,
        exdates: &[NaiveDate],
    ) -> Vec<NaiveDateTime> {
        self.occurrences(dtstart)
            .take_while(|occurrence| occurrence.date() <= horizon)
            .filter(|occurrence| !exdates.contains(&occurrence.date()))
            .collect()
    }
}

fn invalid(rule: &str, reason: impl Into<String>) -> GenerateError {
    GenerateError::InvalidRule {
        rule: rule.to_string(),
        reason: reason.into(),
    }
}

fn parse_by_day(entry: &str) -> Option<ByDay> {
    let re = Regex::new(r"^([+-]?[1-5])?([A-Z]{2})$").ok()?;
    let caps = re.captures(entry)?;
    let ordinal = match caps.get(1) {
        Some(m) => Some(m.as_str().parse::<i8>().ok()?),
        None => None,
    };
    let weekday = parse_weekday(&caps[2])?;
    Some(ByDay { ordinal, weekday })
}

fn parse_until(value: &str) -> Option<NaiveDate> {
    // Accept both DATE (20240315) and DATE-TIME (20240315T090000Z) forms.
    let date_part = if value.len() >= 8 { &value[..8] } else { value };
    NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()
}

fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn add_months(year: i32, month: u32, months: u32) -> (i32, u32) {
    let zero_based = (month - 1) + months;
    (year + (zero_based / 12) as i32, zero_based % 12 + 1)
}

fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, ordinal: i8) -> Option<NaiveDate> {
    if ordinal > 0 {
        return NaiveDate::from_weekday_of_month_opt(year, month, weekday, ordinal as u8);
    }
    let (next_year, next_month) = add_months(year, month, 1);
    let mut date = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    while date.weekday() != weekday {
        date = date.pred_opt()?;
    }
    date.checked_sub_signed(Duration::weeks((-ordinal as i64) - 1))
        .filter(|shifted| shifted.month() == month)
}

enum Cursor {
    Daily {
        next: NaiveDate,
    },
    Weekly {
        week: NaiveDate,
        day_index: usize,
    },
    Monthly {
        year: i32,
        month: u32,
        day_index: usize,
    },
}

/// Restartable iterator over a rule's concrete start times.
pub struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    start_date: NaiveDate,
    time: NaiveTime,
    weekdays: Vec<Weekday>,
    cursor: Cursor,
    emitted: u32,
}

impl<'a> Occurrences<'a> {
    fn new(rule: &'a RecurrenceRule, dtstart: NaiveDateTime) -> Self {
        let start_date = dtstart.date();
        let mut weekdays: Vec<Weekday> = rule.by_day.iter().map(|entry| entry.weekday).collect();
        weekdays.sort_by_key(|day| day.num_days_from_monday());
        weekdays.dedup();
        if weekdays.is_empty() && rule.freq == Frequency::Weekly {
            weekdays.push(start_date.weekday());
        }

        let cursor = match rule.freq {
            Frequency::Daily => Cursor::Daily { next: start_date },
            Frequency::Weekly => Cursor::Weekly {
                week: week_monday(start_date),
                day_index: 0,
            },
            Frequency::Monthly => Cursor::Monthly {
                year: start_date.year(),
                month: start_date.month(),
                day_index: 0,
            },
        };

        Self {
            rule,
            start_date,
            time: dtstart.time(),
            weekdays,
            cursor,
            emitted: 0,
        }
    }

    fn past_until(&self, date: NaiveDate) -> bool {
        self.rule.until.is_some_and(|until| date > until)
    }

    fn next_daily(&mut self) -> Option<NaiveDate> {
        // A DAILY filter can be unsatisfiable when the interval is a
        // multiple of 7; give up after a full cycle of candidates.
        let mut misses = 0;
        loop {
            let Cursor::Daily { next } = &mut self.cursor else {
                return None;
            };
            let candidate = *next;
            *next = candidate + Duration::days(self.rule.interval as i64);
            if self.past_until(candidate) {
                return None;
            }
            if self.weekdays.is_empty() || self.weekdays.contains(&candidate.weekday()) {
                return Some(candidate);
            }
            misses += 1;
            if misses > 7 * self.rule.interval {
                return None;
            }
        }
    }

    fn next_weekly(&mut self) -> Option<NaiveDate> {
        loop {
            let interval = self.rule.interval as i64;
            let Cursor::Weekly { week, day_index } = &mut self.cursor else {
                return None;
            };
            if *day_index >= self.weekdays.len() {
                *week += Duration::weeks(interval);
                *day_index = 0;
                continue;
            }
            let day = self.weekdays[*day_index];
            *day_index += 1;
            let candidate = *week + Duration::days(day.num_days_from_monday() as i64);
            if candidate < self.start_date {
                continue;
            }
            if self.past_until(candidate) {
                return None;
            }
            return Some(candidate);
        }
    }

    fn next_monthly(&mut self) -> Option<NaiveDate> {
        loop {
            let interval = self.rule.interval;
            let fallback_day = self.start_date.day();
            let by_day = &self.rule.by_day;
            let Cursor::Monthly {
                year,
                month,
                day_index,
            } = &mut self.cursor
            else {
                return None;
            };

            let mut candidates: Vec<NaiveDate> = if by_day.is_empty() {
                NaiveDate::from_ymd_opt(*year, *month, fallback_day)
                    .into_iter()
                    .collect()
            } else {
                by_day
                    .iter()
                    .filter_map(|entry| {
                        nth_weekday_of_month(
                            *year,
                            *month,
                            entry.weekday,
                            entry.ordinal.unwrap_or(1),
                        )
                    })
                    .collect()
            };
            candidates.sort();

            if *day_index >= candidates.len() {
                let (next_year, next_month) = add_months(*year, *month, interval);
                *year = next_year;
                *month = next_month;
                *day_index = 0;
                continue;
            }
            let candidate = candidates[*day_index];
            *day_index += 1;
            if candidate < self.start_date {
                continue;
            }
            if self.past_until(candidate) {
                return None;
            }
            return Some(candidate);
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(count) = self.rule.count
            && self.emitted >= count
        {
            return None;
        }
        let date = match self.rule.freq {
            Frequency::Daily => self.next_daily(),
            Frequency::Weekly => self.next_weekly(),
            Frequency::Monthly => self.next_monthly(),
        }?;
        self.emitted += 1;
        Some(date.and_time(self.time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_the_emitted_grammar() {
        let rule = RecurrenceRule::parse("RRULE:FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR").unwrap();
        assert_eq!(rule.freq, Frequency::Daily);
        assert_eq!(rule.by_day.len(), 5);

        let rule = RecurrenceRule::parse("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU").unwrap();
        assert_eq!(rule.interval, 2);

        let rule = RecurrenceRule::parse("FREQ=MONTHLY;BYDAY=1FR").unwrap();
        assert_eq!(rule.by_day[0].ordinal, Some(1));
        assert_eq!(rule.by_day[0].weekday, Weekday::Fri);
    }

    #[test]
    fn rejects_malformed_rules() {
        assert!(RecurrenceRule::parse("").is_err());
        assert!(RecurrenceRule::parse("FREQ=HOURLY").is_err());
        assert!(RecurrenceRule::parse("INTERVAL=2").is_err());
        assert!(RecurrenceRule::parse("FREQ=WEEKLY;BYDAY=XX").is_err());
        assert!(RecurrenceRule::parse("FREQ=WEEKLY;INTERVAL=0").is_err());
    }

    #[test]
    fn daily_byday_skips_weekends() {
        let rule = RecurrenceRule::parse("RRULE:FREQ=DAILY;BYDAY=MO,TU,WE,TH,FR").unwrap();
        // 2024-01-05 is a Friday.
        let occurrences = rule.expand(dt(2024, 1, 5, 9), date(2024, 1, 9), &[]);
        let days: Vec<NaiveDate> = occurrences.iter().map(|o| o.date()).collect();
        assert_eq!(
            days,
            vec![date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 9)]
        );
        assert!(occurrences.iter().all(|o| o.time() == dt(2024, 1, 5, 9).time()));
    }

    #[test]
    fn weekly_defaults_to_dtstart_weekday() {
        let rule = RecurrenceRule::parse("FREQ=WEEKLY").unwrap();
        let occurrences = rule.expand(dt(2024, 1, 3, 14), date(2024, 1, 31), &[]);
        assert_eq!(occurrences.len(), 5);
        assert!(occurrences.iter().all(|o| o.weekday() == Weekday::Wed));
    }

    #[test]
    fn biweekly_steps_two_weeks() {
        let rule = RecurrenceRule::parse("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU").unwrap();
        // 2024-01-02 is a Tuesday.
        let occurrences = rule.expand(dt(2024, 1, 2, 10), date(2024, 2, 27), &[]);
        let days: Vec<NaiveDate> = occurrences.iter().map(|o| o.date()).collect();
        assert_eq!(
            days,
            vec![
                date(2024, 1, 2),
                date(2024, 1, 16),
                date(2024, 1, 30),
                date(2024, 2, 13),
                date(2024, 2, 27),
            ]
        );
    }

    #[test]
    fn monthly_first_friday() {
        let rule = RecurrenceRule::parse("FREQ=MONTHLY;BYDAY=1FR").unwrap();
        let occurrences = rule.expand(dt(2024, 1, 5, 16), date(2024, 4, 30), &[]);
        let days: Vec<NaiveDate> = occurrences.iter().map(|o| o.date()).collect();
        assert_eq!(
            days,
            vec![
                date(2024, 1, 5),
                date(2024, 2, 2),
                date(2024, 3, 1),
                date(2024, 4, 5),
            ]
        );
    }

    #[test]
    fn monthly_last_friday() {
        let rule = RecurrenceRule::parse("FREQ=MONTHLY;BYDAY=-1FR").unwrap();
        let occurrences = rule.expand(dt(2024, 1, 1, 12), date(2024, 2, 29), &[]);
        let days: Vec<NaiveDate> = occurrences.iter().map(|o| o.date()).collect();
        assert_eq!(days, vec![date(2024, 1, 26), date(2024, 2, 23)]);
    }

    #[test]
    fn count_bounds_the_raw_series_before_exdates() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;COUNT=5").unwrap();
        let exdates = vec![date(2024, 1, 3)];
        let occurrences = rule.expand(dt(2024, 1, 1, 8), date(2024, 12, 31), &exdates);
        // Five raw occurrences, one removed by the exception date.
        assert_eq!(occurrences.len(), 4);
        assert!(!occurrences.iter().any(|o| o.date() == date(2024, 1, 3)));
    }

    #[test]
    fn until_terminates_the_series() {
        let rule = RecurrenceRule::parse("FREQ=WEEKLY;BYDAY=MO;UNTIL=20240122").unwrap();
        let occurrences = rule.expand(dt(2024, 1, 1, 9), date(2024, 12, 31), &[]);
        assert_eq!(occurrences.len(), 4);
        assert_eq!(occurrences.last().unwrap().date(), date(2024, 1, 22));
    }

    #[test]
    fn expansion_is_idempotent() {
        let rule = RecurrenceRule::parse("RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH").unwrap();
        let exdates = vec![date(2024, 1, 18)];
        let first = rule.expand(dt(2024, 1, 2, 10), date(2024, 3, 31), &exdates);
        let second = rule.expand(dt(2024, 1, 2, 10), date(2024, 3, 31), &exdates);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn unsatisfiable_daily_filter_terminates() {
        // Interval 7 from a Monday can never hit Saturday.
        let rule = RecurrenceRule::parse("FREQ=DAILY;INTERVAL=7;BYDAY=SA").unwrap();
        let occurrences = rule.expand(dt(2024, 1, 1, 9), date(2025, 1, 1), &[]);
        assert!(occurrences.is_empty());
    }
}
