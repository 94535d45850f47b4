use crate::models::{AttendanceView, RangeStats, SubjectKey, SubjectStats};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Per-subject and aggregate numbers for one policy range.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSnapshot {
    pub stats: RangeStats,
    pub subjects: Vec<SubjectStats>,
}

struct Figures {
    percentage: f64,
    safe_bunks: i64,
    must_attend: i64,
    threshold_reachable: bool,
}

/// Point-in-time arithmetic: the range has fully happened, so the total is
/// fixed and the question is how far above or below the line we sit today.
fn current_figures(present: i64, total: i64, threshold: f64) -> Figures {
    // Max future misses that keep present/total at or above the threshold.
    let margin = (present as f64 / threshold - total as f64).floor() as i64;
    let required = (threshold * total as f64).ceil() as i64;
    let deficit = required - present;
    let percentage = if total > 0 {
        present as f64 / total as f64 * 100.0
    } else {
        100.0
    };
    Figures {
        percentage,
        safe_bunks: margin.max(0),
        must_attend: deficit.max(0),
        threshold_reachable: true,
    }
}

/// Forward-looking arithmetic under the assumption the student attends every
/// remaining lecture in the range. A negative safety margin means the
/// threshold is mathematically out of reach, which is reported, not clamped
/// away.
fn future_figures(present: i64, total: i64, conducted_so_far: i64, threshold: f64) -> Figures {
    let remaining = (total - conducted_so_far).max(0);
    let max_possible_present = present + remaining;
    let required = (threshold * total as f64).ceil() as i64;
    let safety_margin = max_possible_present - required;
    // Shown percentage stays the real rate so far, not a forward guess.
    let denominator = conducted_so_far.max(1);
    Figures {
        percentage: present as f64 / denominator as f64 * 100.0,
        safe_bunks: safety_margin.max(0),
        must_attend: (-safety_margin).max(0),
        threshold_reachable: safety_margin >= 0,
    }
}

/// Joins the projected totals for a range with the recorded attendance.
///
/// `range_totals` is the projection for [semester start, range end];
/// `current_totals` is the projection for [semester start, as_of] and feeds
/// the conducted-so-far baseline of every range. Presence is always capped
/// at `as_of`: nobody has attended a lecture that has not happened yet.
pub fn compute_range(
    history: &[AttendanceView],
    range_totals: &HashMap<SubjectKey, i64>,
    current_totals: &HashMap<SubjectKey, i64>,
    as_of: NaiveDate,
    range_end: NaiveDate,
    threshold: f64,
) -> RangeSnapshot {
    let is_current = range_end <= as_of;

    // Exception adjustments per subject: +1 per extra, -1 per ignored.
    let mut adjustments: HashMap<SubjectKey, i64> = HashMap::new();
    let mut past_adjustments: HashMap<SubjectKey, i64> = HashMap::new();
    for row in history {
        if !(row.is_ignored || row.is_extra) {
            continue;
        }
        let mut delta = 0;
        if row.is_ignored {
            delta -= 1;
        }
        if row.is_extra {
            delta += 1;
        }
        if row.date <= range_end {
            *adjustments.entry(row.key()).or_insert(0) += delta;
        }
        if row.date <= as_of {
            *past_adjustments.entry(row.key()).or_insert(0) += delta;
        }
    }

    let mut overall_total = 0i64;
    let mut overall_present = 0i64;
    let mut overall_conducted = 0i64;

    let ordered: BTreeMap<&SubjectKey, &i64> = range_totals.iter().collect();
    let mut subjects = Vec::with_capacity(ordered.len());

    for (key, &total) in ordered {
        let adjustment = adjustments.get(key).copied().unwrap_or(0);
        let adjusted_total = (total + adjustment).max(0);

        let present = history
            .iter()
            .filter(|r| r.date <= as_of && !r.is_ignored && r.attended && r.key_matches(key))
            .count() as i64;

        let base_conducted = current_totals.get(key).copied().unwrap_or(0);
        let past_adjustment = past_adjustments.get(key).copied().unwrap_or(0);
        let conducted_so_far = (base_conducted + past_adjustment).max(0);

        overall_total += adjusted_total;
        overall_present += present;
        overall_conducted += conducted_so_far;

        let figures = if is_current {
            current_figures(present, adjusted_total, threshold)
        } else {
            future_figures(present, adjusted_total, conducted_so_far, threshold)
        };

        subjects.push(SubjectStats {
            subject: key.subject.clone(),
            kind: key.kind,
            total: adjusted_total,
            present,
            conducted_so_far,
            percentage: figures.percentage,
            safe_bunks: figures.safe_bunks,
            must_attend: figures.must_attend,
            threshold_reachable: figures.threshold_reachable,
        });
    }

    // Aggregate over summed counts, never over per-subject percentages.
    let figures = if is_current {
        current_figures(overall_present, overall_total, threshold)
    } else {
        future_figures(overall_present, overall_total, overall_conducted, threshold)
    };

    RangeSnapshot {
        stats: RangeStats {
            attendance: figures.percentage,
            safe_bunks: figures.safe_bunks,
            must_attend: figures.must_attend,
            total_missed: (overall_conducted - overall_present).max(0),
            total_conducted: overall_total,
            threshold_reachable: figures.threshold_reachable,
        },
        subjects,
    }
}
