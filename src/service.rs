use crate::calendar::{DateSpan, HolidayCalendar};
use crate::error::EngineError;
use crate::models::{
    AttendanceView, AvailableLecture, BunkWindow, DayHistory, DayLecture, DedupOutcome,
    InstanceStatus, LectureKind, LectureTemplate, ProjectionReport, RangeReport, Student,
    SubjectKey, SubjectStats, SyncOutcome,
};
use crate::planner::longest_bunk_window;
use crate::resolver::{batch_matches, chose_elective, elective_names, resolve_templates};
use crate::schedule::{project_occurrences, projected_totals};
use crate::stats::compute_range;
use crate::store::{AttendanceUpdate, Store};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A policy date boundary: stats for this range assume full attendance from
/// the as-of date up to `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCutoff {
    pub label: String,
    pub end: NaiveDate,
}

impl RangeCutoff {
    pub fn new(label: &str, end: NaiveDate) -> RangeCutoff {
        RangeCutoff {
            label: label.to_string(),
            end,
        }
    }
}

/// Explicit engine configuration; nothing here lives in process globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Academic-calendar document key, e.g. "2025-2026".
    pub academic_year: String,
    pub semester_start: NaiveDate,
    /// Sync projects up to as-of + this many days.
    pub lookahead_days: i64,
    /// Attendance policy line, 0.75 = 75%.
    pub threshold: f64,
    /// Hard bound on any projected span, in days.
    pub max_span_days: i64,
    /// Backfilled attendance rows start as present. Unusual but deliberate:
    /// the tracker assumes attendance until the student marks a miss.
    pub default_attended: bool,
    /// Future checkpoints reported in addition to "Current".
    pub cutoffs: Vec<RangeCutoff>,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        EngineConfig {
            academic_year: "2025-2026".to_string(),
            semester_start: ymd(2026, 1, 27),
            lookahead_days: 2,
            threshold: 0.75,
            max_span_days: DateSpan::MAX_DAYS,
            default_attended: true,
            cutoffs: vec![
                RangeCutoff::new("Defaulter 1", ymd(2026, 3, 2)),
                RangeCutoff::new("Defaulter 2", ymd(2026, 4, 2)),
                RangeCutoff::new("Final", ymd(2026, 5, 15)),
            ],
        }
    }
}

/// Refers to a lecture either by instance id or by (template, date).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LectureRef {
    Instance(i64),
    Template { template_id: i64, date: NaiveDate },
}

/// The attendance engine proper. Owns a `Store` implementation and a config;
/// every public operation is synchronous and safe to retry.
pub struct AttendanceService<S: Store> {
    store: S,
    config: EngineConfig,
}

impl<S: Store> AttendanceService<S> {
    pub fn new(store: S, config: EngineConfig) -> AttendanceService<S> {
        AttendanceService { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn student(&self, student_id: i64) -> Result<Student, EngineError> {
        self.store
            .student(student_id)
            .ok_or(EngineError::StudentNotFound(student_id))
    }

    fn holidays(&self) -> HolidayCalendar {
        match self.store.academic_calendar(&self.config.academic_year) {
            Some(calendar) => HolidayCalendar::resolve(&calendar),
            None => {
                // Non-fatal: projections run with Sundays as the only breaks.
                log::warn!(
                    "no academic calendar for {}, holiday set is empty",
                    self.config.academic_year
                );
                HolidayCalendar::empty()
            }
        }
    }

    fn resolved_templates(&self, student: &Student) -> Vec<LectureTemplate> {
        let templates =
            self.store
                .active_templates(&student.branch, &student.division, student.semester);
        let electives = self.store.electives(&student.branch, student.semester);
        resolve_templates(templates, &electives, student)
    }

    /// Projects the student's timetable from semester start to
    /// as-of + lookahead and backfills instance and attendance rows.
    /// Always a full re-projection so elective changes and missed days heal;
    /// insert-if-absent keeps it idempotent.
    pub fn sync_schedule(
        &self,
        student_id: i64,
        as_of: NaiveDate,
    ) -> Result<SyncOutcome, EngineError> {
        let student = self.student(student_id)?;
        let end = as_of + Duration::days(self.config.lookahead_days);
        if end < self.config.semester_start {
            // Term has not started; nothing to project yet.
            return Ok(SyncOutcome::default());
        }
        let span = DateSpan::bounded(self.config.semester_start, end, self.config.max_span_days)?;

        let holidays = self.holidays();
        let resolved = self.resolved_templates(&student);
        let occurrences = project_occurrences(&resolved, span, &holidays);

        let rows: Vec<(i64, NaiveDate)> =
            occurrences.iter().map(|o| (o.template_id, o.date)).collect();
        let instances_created = self.store.insert_instances_if_absent(&rows);

        let template_ids: Vec<i64> = resolved.iter().map(|t| t.id).collect();
        let instance_ids = self
            .store
            .instance_ids_in_range(&template_ids, span.start(), span.end());
        let attendance_created = self.store.insert_attendance_if_absent(
            student_id,
            &instance_ids,
            self.config.default_attended,
        );

        log::debug!(
            "sync student {}: {} occurrences, {} new instances, {} new attendance rows",
            student_id,
            occurrences.len(),
            instances_created,
            attendance_created
        );

        Ok(SyncOutcome {
            occurrences: occurrences.len(),
            instances_created,
            attendance_created,
        })
    }

    /// Computes the full dashboard payload: stats for "Current" plus every
    /// configured cutoff, a bunk window per future range, today's lectures
    /// and the marked history.
    pub fn projection_report(
        &self,
        student_id: i64,
        as_of: NaiveDate,
    ) -> Result<ProjectionReport, EngineError> {
        let student = self.student(student_id)?;
        if as_of < self.config.semester_start {
            return Err(EngineError::InvalidRange {
                start: self.config.semester_start,
                end: as_of,
            });
        }

        let holidays = self.holidays();
        let resolved = self.resolved_templates(&student);
        let history = self.store.attendance_history(student_id);

        // Baseline totals up to today; every range's conducted-so-far
        // denominator comes from here.
        let current_span =
            DateSpan::bounded(self.config.semester_start, as_of, self.config.max_span_days)?;
        let current_totals = projected_totals(&resolved, current_span, &holidays);

        let mut cutoffs = vec![RangeCutoff::new("Current", as_of)];
        cutoffs.extend(self.config.cutoffs.iter().cloned());

        let mut ranges = Vec::with_capacity(cutoffs.len());
        for cutoff in cutoffs {
            let range_totals = if cutoff.end == as_of {
                current_totals.clone()
            } else {
                let span = DateSpan::bounded(
                    self.config.semester_start,
                    cutoff.end,
                    self.config.max_span_days,
                )?;
                projected_totals(&resolved, span, &holidays)
            };

            let snapshot = compute_range(
                &history,
                &range_totals,
                &current_totals,
                as_of,
                cutoff.end,
                self.config.threshold,
            );

            let bunk_window = if cutoff.end > as_of {
                Some(self.bunk_window(&resolved, &holidays, &snapshot.subjects, as_of, cutoff.end)?)
            } else {
                None
            };

            ranges.push(RangeReport {
                label: cutoff.label,
                end: cutoff.end,
                stats: snapshot.stats,
                subjects: snapshot.subjects,
                bunk_window,
            });
        }

        Ok(ProjectionReport {
            schedule: day_schedule(&history, as_of),
            history: group_history(&history),
            ranges,
        })
    }

    fn bunk_window(
        &self,
        resolved: &[LectureTemplate],
        holidays: &HolidayCalendar,
        subjects: &[SubjectStats],
        as_of: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<BunkWindow, EngineError> {
        let tomorrow = as_of + Duration::days(1);
        if tomorrow > range_end {
            return Ok(BunkWindow::empty());
        }
        let budgets: HashMap<SubjectKey, i64> = subjects
            .iter()
            .map(|s| (SubjectKey::new(&s.subject, s.kind), s.safe_bunks))
            .collect();
        let span = DateSpan::bounded(tomorrow, range_end, self.config.max_span_days)?;
        let upcoming = project_occurrences(resolved, span, holidays);
        Ok(longest_bunk_window(&upcoming, &budgets))
    }

    /// Flips the attended flag on an existing row; last write wins.
    pub fn toggle_attendance(
        &self,
        student_id: i64,
        instance_id: i64,
        attended: bool,
    ) -> Result<(), EngineError> {
        self.student(student_id)?;
        let update = AttendanceUpdate {
            attended: Some(attended),
            ..Default::default()
        };
        if self.store.update_attendance(student_id, instance_id, &update) {
            Ok(())
        } else {
            Err(EngineError::AttendanceNotFound {
                student_id,
                instance_id,
            })
        }
    }

    /// Records attendance of a session outside the student's own timetable,
    /// e.g. another batch's practical. Creates the instance on demand.
    pub fn add_extra_lecture(
        &self,
        student_id: i64,
        template_id: i64,
        date: NaiveDate,
    ) -> Result<(), EngineError> {
        self.student(student_id)?;
        let instance = match self.store.find_instance(template_id, date) {
            Some(instance) => instance,
            None => {
                if self.store.template(template_id).is_none() {
                    return Err(EngineError::TemplateNotFound(template_id));
                }
                self.store
                    .create_instance(template_id, date, InstanceStatus::Scheduled)
            }
        };
        // Extra and ignored stay mutually exclusive on every write.
        let update = AttendanceUpdate {
            attended: Some(true),
            is_ignored: Some(false),
            is_extra: Some(true),
        };
        self.store
            .upsert_attendance(student_id, instance.id, true, &update);
        Ok(())
    }

    /// Marks a scheduled lecture as not applicable for this student; the row
    /// drops out of every total.
    pub fn remove_lecture(
        &self,
        student_id: i64,
        lecture: LectureRef,
    ) -> Result<(), EngineError> {
        self.student(student_id)?;
        let instance = match lecture {
            LectureRef::Instance(instance_id) => self
                .store
                .instance(instance_id)
                .ok_or(EngineError::InstanceNotFound(instance_id))?,
            LectureRef::Template { template_id, date } => self
                .store
                .find_instance(template_id, date)
                .ok_or(EngineError::InstanceNotScheduled { template_id, date })?,
        };
        let update = AttendanceUpdate {
            attended: None,
            is_ignored: Some(true),
            is_extra: Some(false),
        };
        self.store
            .upsert_attendance(student_id, instance.id, false, &update);
        Ok(())
    }

    /// Administrative cleanup: among the student's chosen electives, sections
    /// that lost to a direct batch match are duplicate offerings. Their
    /// instances and attendance rows are removed so they stop inflating
    /// totals. Safe to re-run.
    pub fn fix_duplicate_templates(&self, student_id: i64) -> Result<DedupOutcome, EngineError> {
        let student = self.student(student_id)?;
        let all = self
            .store
            .active_branch_templates(&student.branch, student.semester);
        let electives = self.store.electives(&student.branch, student.semester);
        let elective_subjects = elective_names(&electives);

        let chosen: Vec<LectureTemplate> = all
            .into_iter()
            .filter(|t| {
                elective_subjects.contains(&t.subject) && chose_elective(&student, &t.subject)
            })
            .collect();

        let mut grouped: BTreeMap<(String, LectureKind), Vec<LectureTemplate>> = BTreeMap::new();
        for template in chosen {
            grouped
                .entry((template.subject.clone(), template.kind))
                .or_default()
                .push(template);
        }

        let mut invalid: Vec<i64> = Vec::new();
        let mut log_lines: Vec<String> = Vec::new();
        for ((subject, kind), group) in grouped {
            let (matches, others): (Vec<LectureTemplate>, Vec<LectureTemplate>) =
                group.into_iter().partition(|t| batch_matches(t, &student));
            if matches.is_empty() {
                log_lines.push(format!(
                    "No exact batch match for {}-{}. Keeping all sections.",
                    subject, kind
                ));
            } else if !others.is_empty() {
                log_lines.push(format!(
                    "Duplicates for {}-{}: keeping {:?}, removing {:?}.",
                    subject,
                    kind,
                    matches.iter().map(|t| t.batch.clone()).collect::<Vec<_>>(),
                    others.iter().map(|t| t.batch.clone()).collect::<Vec<_>>()
                ));
                invalid.extend(others.iter().map(|t| t.id));
            }
        }

        if invalid.is_empty() {
            return Ok(DedupOutcome {
                log: log_lines,
                ..Default::default()
            });
        }

        let purged = self.store.purge_templates(&invalid);
        log::debug!(
            "dedup student {}: removed {} instances, {} attendance rows",
            student_id,
            purged.instances_removed,
            purged.attendance_removed
        );
        Ok(DedupOutcome {
            removed_attendance: purged.attendance_removed,
            removed_instances: purged.instances_removed,
            cleaned_templates: invalid,
            log: log_lines,
        })
    }

    /// Every active section offered on this date across the branch, flagged
    /// with whether it belongs to the student's own batch.
    pub fn available_lectures(
        &self,
        student_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<AvailableLecture>, EngineError> {
        let student = self.student(student_id)?;
        let weekday = date.weekday().number_from_monday();
        let mut templates =
            self.store
                .templates_for_weekday(&student.branch, student.semester, weekday);
        templates.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(templates
            .into_iter()
            .map(|t| {
                let is_my_batch = batch_matches(&t, &student);
                AvailableLecture {
                    template_id: t.id,
                    subject: t.subject,
                    kind: t.kind,
                    start_time: t.start_time,
                    end_time: t.end_time,
                    faculty: t.faculty,
                    room: t.room,
                    batch: t.batch,
                    is_my_batch,
                }
            })
            .collect())
    }
}

fn day_lecture(row: &AttendanceView) -> DayLecture {
    DayLecture {
        instance_id: row.instance_id,
        attendance_id: row.attendance_id,
        subject: row.subject.clone(),
        kind: row.kind,
        time: format!("{} - {}", row.start_time, row.end_time),
        room: row.room.clone(),
        faculty: row.faculty.clone(),
        attended: row.attended,
    }
}

fn day_schedule(history: &[AttendanceView], date: NaiveDate) -> Vec<DayLecture> {
    // History is already (date, start time) ordered.
    history
        .iter()
        .filter(|r| r.date == date)
        .map(day_lecture)
        .collect()
}

fn group_history(history: &[AttendanceView]) -> Vec<DayHistory> {
    let mut by_day: BTreeMap<NaiveDate, Vec<DayLecture>> = BTreeMap::new();
    for row in history {
        by_day.entry(row.date).or_default().push(day_lecture(row));
    }
    // Newest day first; lectures within a day stay in time order.
    by_day
        .into_iter()
        .rev()
        .map(|(date, lectures)| DayHistory { date, lectures })
        .collect()
}
