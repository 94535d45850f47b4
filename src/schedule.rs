use crate::calendar::{DateSpan, HolidayCalendar};
use crate::models::{LectureTemplate, Occurrence, SubjectKey};
use chrono::Datelike;
use std::collections::HashMap;

/// Expands resolved weekly templates into dated occurrences over the span,
/// oldest first, same-day lectures ordered by start time. Holidays yield
/// nothing.
pub fn project_occurrences(
    templates: &[LectureTemplate],
    span: DateSpan,
    holidays: &HolidayCalendar,
) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for date in span.days() {
        if holidays.is_holiday(date) {
            continue;
        }
        let weekday = date.weekday().number_from_monday();
        let mut daily: Vec<&LectureTemplate> =
            templates.iter().filter(|t| t.weekday == weekday).collect();
        daily.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        for template in daily {
            occurrences.push(Occurrence::of(template, date));
        }
    }
    occurrences
}

/// Per (subject, kind) occurrence counts for the span. A pure function of
/// the resolved templates, the holiday set and the span; attendance records
/// never feed into it.
pub fn projected_totals(
    templates: &[LectureTemplate],
    span: DateSpan,
    holidays: &HolidayCalendar,
) -> HashMap<SubjectKey, i64> {
    let mut totals: HashMap<SubjectKey, i64> = HashMap::new();
    for occurrence in project_occurrences(templates, span, holidays) {
        *totals.entry(occurrence.key()).or_insert(0) += 1;
    }
    totals
}
