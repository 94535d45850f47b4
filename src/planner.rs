use crate::models::{BunkWindow, Occurrence, SubjectKey};
use std::collections::HashMap;

/// Finds the longest contiguous run of upcoming lectures that stays within
/// every subject's safe-bunk budget.
///
/// Two-pointer sliding window over the time-ordered schedule: grow on the
/// right, and while the newest subject is over budget shrink from the left.
/// Ties resolve to the first maximal window. Subjects missing from the
/// budget map have a budget of zero.
pub fn longest_bunk_window(
    schedule: &[Occurrence],
    budgets: &HashMap<SubjectKey, i64>,
) -> BunkWindow {
    let mut window = BunkWindow::empty();
    let mut usage: HashMap<SubjectKey, i64> = HashMap::new();
    let mut left = 0usize;

    for right in 0..schedule.len() {
        let key = schedule[right].key();
        *usage.entry(key.clone()).or_insert(0) += 1;

        // Only the key just added can be over budget.
        while usage.get(&key).copied().unwrap_or(0) > budgets.get(&key).copied().unwrap_or(0) {
            let evicted = schedule[left].key();
            if let Some(count) = usage.get_mut(&evicted) {
                *count -= 1;
            }
            left += 1;
        }

        // left can sit one past right when the new key has no budget at all.
        let size = right + 1 - left;
        if size > window.lectures {
            window.lectures = size;
            window.start_date = Some(schedule[left].date);
            window.end_date = Some(schedule[right].date);
            window.run = schedule[left..=right].to_vec();
        }
    }
    window
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LectureKind;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn occurrence(subject: &str, day: u32) -> Occurrence {
        Occurrence {
            template_id: 1,
            subject: subject.to_string(),
            kind: LectureKind::Theory,
            date: date(2026, 3, day),
            start_time: "09:00".to_string(),
            end_time: "09:55".to_string(),
            room: "A-101".to_string(),
            faculty: "Staff".to_string(),
        }
    }

    fn key(subject: &str) -> SubjectKey {
        SubjectKey::new(subject, LectureKind::Theory)
    }

    /// Exhaustive check over every contiguous window.
    fn brute_force(schedule: &[Occurrence], budgets: &HashMap<SubjectKey, i64>) -> usize {
        let mut best = 0;
        for start in 0..schedule.len() {
            for end in start..schedule.len() {
                let mut usage: HashMap<SubjectKey, i64> = HashMap::new();
                for occurrence in &schedule[start..=end] {
                    *usage.entry(occurrence.key()).or_insert(0) += 1;
                }
                let valid = usage
                    .iter()
                    .all(|(k, used)| *used <= budgets.get(k).copied().unwrap_or(0));
                if valid {
                    best = best.max(end - start + 1);
                }
            }
        }
        best
    }

    #[test]
    fn empty_schedule_yields_empty_window() {
        let window = longest_bunk_window(&[], &HashMap::new());
        assert!(window.is_empty());
        assert_eq!(window.start_date, None);
        assert_eq!(window.end_date, None);
    }

    #[test]
    fn zero_budgets_yield_empty_window() {
        let schedule = vec![occurrence("CC", 2), occurrence("DAV", 3)];
        let budgets = HashMap::from([(key("CC"), 0), (key("DAV"), 0)]);
        let window = longest_bunk_window(&schedule, &budgets);
        assert!(window.is_empty());
    }

    #[test]
    fn window_respects_every_budget() {
        let schedule = vec![
            occurrence("CC", 2),
            occurrence("DAV", 2),
            occurrence("CC", 3),
            occurrence("DAV", 3),
            occurrence("CC", 4),
            occurrence("SPM", 4),
        ];
        let budgets = HashMap::from([(key("CC"), 2), (key("DAV"), 1), (key("SPM"), 1)]);
        let window = longest_bunk_window(&schedule, &budgets);

        let mut usage: HashMap<SubjectKey, i64> = HashMap::new();
        for occurrence in &window.run {
            *usage.entry(occurrence.key()).or_insert(0) += 1;
        }
        for (k, used) in usage {
            assert!(used <= budgets[&k]);
        }
        assert_eq!(window.lectures, brute_force(&schedule, &budgets));
    }

    #[test]
    fn missing_budget_means_zero() {
        let schedule = vec![occurrence("CC", 2), occurrence("XX", 3), occurrence("CC", 4)];
        let budgets = HashMap::from([(key("CC"), 5)]);
        let window = longest_bunk_window(&schedule, &budgets);
        // The unbudgeted subject splits the run; either side has length 1.
        assert_eq!(window.lectures, 1);
        assert_eq!(window.start_date, Some(date(2026, 3, 2)));
    }

    #[test]
    fn matches_brute_force_on_a_grid_of_schedules() {
        let subjects = ["CC", "DAV", "SPM"];
        // A deterministic pseudo-random pattern of lectures.
        let schedule: Vec<Occurrence> = (0u32..12)
            .map(|i| occurrence(subjects[(i * 7 % 13) as usize % 3], i + 1))
            .collect();

        for cc in 0..3i64 {
            for dav in 0..3i64 {
                let budgets =
                    HashMap::from([(key("CC"), cc), (key("DAV"), dav), (key("SPM"), 1)]);
                let window = longest_bunk_window(&schedule, &budgets);
                assert_eq!(
                    window.lectures,
                    brute_force(&schedule, &budgets),
                    "cc={} dav={}",
                    cc,
                    dav
                );
            }
        }
    }

    #[test]
    fn first_maximal_window_wins_ties() {
        let schedule = vec![
            occurrence("CC", 2),
            occurrence("DAV", 3),
            occurrence("CC", 4),
            occurrence("DAV", 5),
        ];
        // Budget allows any single lecture; the first one is reported.
        let budgets = HashMap::from([(key("CC"), 1), (key("DAV"), 0)]);
        let window = longest_bunk_window(&schedule, &budgets);
        assert_eq!(window.lectures, 1);
        assert_eq!(window.start_date, Some(date(2026, 3, 2)));
        assert_eq!(window.end_date, Some(date(2026, 3, 2)));
    }
}
