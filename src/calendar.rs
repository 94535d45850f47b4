use crate::error::EngineError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Academic-year calendar document, the shape the institute publishes:
/// a list of months, each with dated events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicCalendar {
    pub year: String,
    pub months: Vec<CalendarMonth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub month: String,
    pub year: i32,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Day of month.
    pub date: u32,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Day name ("Sunday", "Monday", ...), present on non-holiday entries.
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl AcademicCalendar {
    /// Reads the document out of the stored JSON wrapper
    /// (`{ "academicCalendar": { "months": [...] } }`).
    pub fn parse(year: &str, document: &serde_json::Value) -> Option<AcademicCalendar> {
        let months = document.get("academicCalendar")?.get("months")?;
        let months: Vec<CalendarMonth> = serde_json::from_value(months.clone()).ok()?;
        Some(AcademicCalendar {
            year: year.to_string(),
            months,
        })
    }
}

fn month_number(name: &str) -> Option<u32> {
    let names = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    names.iter().position(|m| *m == name).map(|i| i as u32 + 1)
}

/// The set of non-instructional dates for one academic year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayCalendar {
    dates: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    /// No listed holidays. Sundays still count (see `is_holiday`).
    pub fn empty() -> HolidayCalendar {
        HolidayCalendar::default()
    }

    /// An event contributes a holiday when its type is "Holiday" or its day
    /// name is "Sunday". Unknown month names and impossible day-of-month
    /// values are skipped with a warning, never a crash.
    pub fn resolve(calendar: &AcademicCalendar) -> HolidayCalendar {
        let mut dates = HashSet::new();
        for month in &calendar.months {
            let Some(month_no) = month_number(&month.month) else {
                log::warn!(
                    "academic calendar {}: unknown month name '{}', skipping",
                    calendar.year,
                    month.month
                );
                continue;
            };
            for event in &month.events {
                let is_holiday = event.kind.as_deref() == Some("Holiday")
                    || event.day.as_deref() == Some("Sunday");
                if !is_holiday {
                    continue;
                }
                match NaiveDate::from_ymd_opt(month.year, month_no, event.date) {
                    Some(date) => {
                        dates.insert(date);
                    }
                    None => log::warn!(
                        "academic calendar {}: no day {} in {} {}",
                        calendar.year,
                        event.date,
                        month.month,
                        month.year
                    ),
                }
            }
        }
        HolidayCalendar { dates }
    }

    /// Every Sunday is non-instructional whether or not the document lists it.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        date.weekday() == Weekday::Sun || self.dates.contains(&date)
    }

    pub fn listed_count(&self) -> usize {
        self.dates.len()
    }
}

/// A closed, inclusive day range with a hard length cap. The single source
/// for every date loop in the engine, so the projector and both stats
/// helpers can never drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    /// Safety bound against misconfigured ranges.
    pub const MAX_DAYS: i64 = 365;

    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<DateSpan, EngineError> {
        DateSpan::bounded(start, end, DateSpan::MAX_DAYS)
    }

    pub fn bounded(start: NaiveDate, end: NaiveDate, cap_days: i64) -> Result<DateSpan, EngineError> {
        if end < start || (end - start).num_days() + 1 > cap_days {
            return Err(EngineError::InvalidRange { start, end });
        }
        Ok(DateSpan { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Lazy, restartable walk over every date in the span.
    pub fn days(&self) -> Days {
        Days {
            next: Some(self.start),
            end: self.end,
        }
    }
}

pub struct Days {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|d| *d <= self.end);
        Some(current)
    }
}
