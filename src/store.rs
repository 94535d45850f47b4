use crate::calendar::AcademicCalendar;
use crate::models::{
    Attendance, AttendanceView, ElectivePair, InstanceStatus, LectureInstance, LectureTemplate,
    Student,
};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashSet;

/// Partial update of one attendance row; None leaves the flag alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceUpdate {
    pub attended: Option<bool>,
    pub is_ignored: Option<bool>,
    pub is_extra: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub attendance_removed: usize,
    pub instances_removed: usize,
}

/// The persistence collaborator the engine computes against. Implementations
/// are expected to make the bulk inserts set-based (insert-if-absent keyed on
/// (template, date) and (student, instance)) so re-syncing stays cheap and
/// idempotent.
pub trait Store {
    fn student(&self, student_id: i64) -> Option<Student>;
    fn template(&self, template_id: i64) -> Option<LectureTemplate>;

    /// Active templates for the student's exact (branch, division, semester).
    fn active_templates(&self, branch: &str, division: &str, semester: u8) -> Vec<LectureTemplate>;
    /// Active templates across the whole branch + semester (all divisions).
    fn active_branch_templates(&self, branch: &str, semester: u8) -> Vec<LectureTemplate>;
    /// Branch-wide active templates on one weekday, for the extra-lecture picker.
    fn templates_for_weekday(&self, branch: &str, semester: u8, weekday: u32)
        -> Vec<LectureTemplate>;

    fn electives(&self, branch: &str, semester: u8) -> Vec<ElectivePair>;
    fn academic_calendar(&self, year: &str) -> Option<AcademicCalendar>;

    fn instance(&self, instance_id: i64) -> Option<LectureInstance>;
    fn find_instance(&self, template_id: i64, date: NaiveDate) -> Option<LectureInstance>;
    /// Creates the (template, date) instance, or returns the existing one.
    fn create_instance(
        &self,
        template_id: i64,
        date: NaiveDate,
        status: InstanceStatus,
    ) -> LectureInstance;
    /// Bulk insert-if-absent; returns how many rows were actually new.
    fn insert_instances_if_absent(&self, rows: &[(i64, NaiveDate)]) -> usize;
    fn instance_ids_in_range(
        &self,
        template_ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<i64>;

    /// Bulk insert-if-absent of default attendance rows; returns new-row count.
    fn insert_attendance_if_absent(
        &self,
        student_id: i64,
        instance_ids: &[i64],
        attended: bool,
    ) -> usize;
    /// All rows for the student joined with instance date and template
    /// details, ordered by (date, start time). Rows referencing a missing
    /// instance or template are skipped, not fatal.
    fn attendance_history(&self, student_id: i64) -> Vec<AttendanceView>;
    /// Keyed update; false when no row exists for (student, instance).
    fn update_attendance(
        &self,
        student_id: i64,
        instance_id: i64,
        update: &AttendanceUpdate,
    ) -> bool;
    /// Update-or-create keyed on (student, instance).
    fn upsert_attendance(
        &self,
        student_id: i64,
        instance_id: i64,
        attended_on_create: bool,
        update: &AttendanceUpdate,
    );

    /// Removes every instance and attendance row tied to the given templates.
    /// Only used by the administrative dedup pass.
    fn purge_templates(&self, template_ids: &[i64]) -> PurgeOutcome;
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    students: Vec<Student>,
    templates: Vec<LectureTemplate>,
    electives: Vec<ElectivePair>,
    calendars: Vec<AcademicCalendar>,
    instances: Vec<LectureInstance>,
    attendance: Vec<Attendance>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn apply_update(row: &mut Attendance, update: &AttendanceUpdate) {
    if let Some(attended) = update.attended {
        row.attended = attended;
    }
    if let Some(is_ignored) = update.is_ignored {
        row.is_ignored = is_ignored;
    }
    if let Some(is_extra) = update.is_extra {
        row.is_extra = is_extra;
    }
}

/// Row storage for the demo binary and the test suite. Single-threaded by
/// design; real deployments put a database behind the `Store` trait instead.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RefCell<Tables>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }

    /// Stores the student under a fresh id and returns it.
    pub fn add_student(&self, mut student: Student) -> i64 {
        let mut tables = self.inner.borrow_mut();
        student.id = tables.allocate_id();
        let id = student.id;
        tables.students.push(student);
        id
    }

    pub fn add_template(&self, mut template: LectureTemplate) -> i64 {
        let mut tables = self.inner.borrow_mut();
        template.id = tables.allocate_id();
        let id = template.id;
        tables.templates.push(template);
        id
    }

    /// Templates are superseded, never edited in place.
    pub fn deactivate_template(&self, template_id: i64) {
        let mut tables = self.inner.borrow_mut();
        if let Some(template) = tables.templates.iter_mut().find(|t| t.id == template_id) {
            template.is_active = false;
        }
    }

    pub fn add_elective(&self, pair: ElectivePair) {
        self.inner.borrow_mut().electives.push(pair);
    }

    pub fn add_calendar(&self, calendar: AcademicCalendar) {
        self.inner.borrow_mut().calendars.push(calendar);
    }

    pub fn instance_count(&self) -> usize {
        self.inner.borrow().instances.len()
    }

    pub fn attendance_count(&self) -> usize {
        self.inner.borrow().attendance.len()
    }
}

impl Store for InMemoryStore {
    fn student(&self, student_id: i64) -> Option<Student> {
        self.inner
            .borrow()
            .students
            .iter()
            .find(|s| s.id == student_id)
            .cloned()
    }

    fn template(&self, template_id: i64) -> Option<LectureTemplate> {
        self.inner
            .borrow()
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
    }

    fn active_templates(&self, branch: &str, division: &str, semester: u8) -> Vec<LectureTemplate> {
        self.inner
            .borrow()
            .templates
            .iter()
            .filter(|t| {
                t.is_active && t.branch == branch && t.division == division && t.semester == semester
            })
            .cloned()
            .collect()
    }

    fn active_branch_templates(&self, branch: &str, semester: u8) -> Vec<LectureTemplate> {
        self.inner
            .borrow()
            .templates
            .iter()
            .filter(|t| t.is_active && t.branch == branch && t.semester == semester)
            .cloned()
            .collect()
    }

    fn templates_for_weekday(
        &self,
        branch: &str,
        semester: u8,
        weekday: u32,
    ) -> Vec<LectureTemplate> {
        self.inner
            .borrow()
            .templates
            .iter()
            .filter(|t| {
                t.is_active && t.branch == branch && t.semester == semester && t.weekday == weekday
            })
            .cloned()
            .collect()
    }

    fn electives(&self, branch: &str, semester: u8) -> Vec<ElectivePair> {
        self.inner
            .borrow()
            .electives
            .iter()
            .filter(|e| e.branch == branch && e.semester == semester)
            .cloned()
            .collect()
    }

    fn academic_calendar(&self, year: &str) -> Option<AcademicCalendar> {
        self.inner
            .borrow()
            .calendars
            .iter()
            .find(|c| c.year == year)
            .cloned()
    }

    fn instance(&self, instance_id: i64) -> Option<LectureInstance> {
        self.inner
            .borrow()
            .instances
            .iter()
            .find(|i| i.id == instance_id)
            .cloned()
    }

    fn find_instance(&self, template_id: i64, date: NaiveDate) -> Option<LectureInstance> {
        self.inner
            .borrow()
            .instances
            .iter()
            .find(|i| i.template_id == template_id && i.date == date)
            .cloned()
    }

    fn create_instance(
        &self,
        template_id: i64,
        date: NaiveDate,
        status: InstanceStatus,
    ) -> LectureInstance {
        if let Some(existing) = self.find_instance(template_id, date) {
            return existing;
        }
        let mut tables = self.inner.borrow_mut();
        let id = tables.allocate_id();
        let instance = LectureInstance {
            id,
            template_id,
            date,
            status,
        };
        tables.instances.push(instance.clone());
        instance
    }

    fn insert_instances_if_absent(&self, rows: &[(i64, NaiveDate)]) -> usize {
        let mut tables = self.inner.borrow_mut();
        let mut existing: HashSet<(i64, NaiveDate)> = tables
            .instances
            .iter()
            .map(|i| (i.template_id, i.date))
            .collect();
        let mut created = 0;
        for &(template_id, date) in rows {
            if existing.insert((template_id, date)) {
                let id = tables.allocate_id();
                tables.instances.push(LectureInstance {
                    id,
                    template_id,
                    date,
                    status: InstanceStatus::Scheduled,
                });
                created += 1;
            }
        }
        created
    }

    fn instance_ids_in_range(
        &self,
        template_ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<i64> {
        let wanted: HashSet<i64> = template_ids.iter().copied().collect();
        self.inner
            .borrow()
            .instances
            .iter()
            .filter(|i| wanted.contains(&i.template_id) && start <= i.date && i.date <= end)
            .map(|i| i.id)
            .collect()
    }

    fn insert_attendance_if_absent(
        &self,
        student_id: i64,
        instance_ids: &[i64],
        attended: bool,
    ) -> usize {
        let mut tables = self.inner.borrow_mut();
        let mut existing: HashSet<i64> = tables
            .attendance
            .iter()
            .filter(|a| a.student_id == student_id)
            .map(|a| a.instance_id)
            .collect();
        let mut created = 0;
        for &instance_id in instance_ids {
            if existing.insert(instance_id) {
                let id = tables.allocate_id();
                tables.attendance.push(Attendance {
                    id,
                    student_id,
                    instance_id,
                    attended,
                    is_ignored: false,
                    is_extra: false,
                });
                created += 1;
            }
        }
        created
    }

    fn attendance_history(&self, student_id: i64) -> Vec<AttendanceView> {
        let tables = self.inner.borrow();
        let mut views = Vec::new();
        for row in tables.attendance.iter().filter(|a| a.student_id == student_id) {
            let Some(instance) = tables.instances.iter().find(|i| i.id == row.instance_id) else {
                log::warn!(
                    "attendance {} references missing instance {}, skipping",
                    row.id,
                    row.instance_id
                );
                continue;
            };
            let Some(template) = tables
                .templates
                .iter()
                .find(|t| t.id == instance.template_id)
            else {
                log::warn!(
                    "instance {} references missing template {}, skipping",
                    instance.id,
                    instance.template_id
                );
                continue;
            };
            views.push(AttendanceView {
                attendance_id: row.id,
                instance_id: instance.id,
                template_id: template.id,
                date: instance.date,
                subject: template.subject.clone(),
                kind: template.kind,
                start_time: template.start_time.clone(),
                end_time: template.end_time.clone(),
                room: template.room.clone(),
                faculty: template.faculty.clone(),
                attended: row.attended,
                is_ignored: row.is_ignored,
                is_extra: row.is_extra,
            });
        }
        views.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });
        views
    }

    fn update_attendance(
        &self,
        student_id: i64,
        instance_id: i64,
        update: &AttendanceUpdate,
    ) -> bool {
        let mut tables = self.inner.borrow_mut();
        match tables
            .attendance
            .iter_mut()
            .find(|a| a.student_id == student_id && a.instance_id == instance_id)
        {
            Some(row) => {
                apply_update(row, update);
                true
            }
            None => false,
        }
    }

    fn upsert_attendance(
        &self,
        student_id: i64,
        instance_id: i64,
        attended_on_create: bool,
        update: &AttendanceUpdate,
    ) {
        let mut tables = self.inner.borrow_mut();
        if let Some(row) = tables
            .attendance
            .iter_mut()
            .find(|a| a.student_id == student_id && a.instance_id == instance_id)
        {
            apply_update(row, update);
            return;
        }
        let id = tables.allocate_id();
        let mut row = Attendance {
            id,
            student_id,
            instance_id,
            attended: attended_on_create,
            is_ignored: false,
            is_extra: false,
        };
        apply_update(&mut row, update);
        tables.attendance.push(row);
    }

    fn purge_templates(&self, template_ids: &[i64]) -> PurgeOutcome {
        let doomed: HashSet<i64> = template_ids.iter().copied().collect();
        let mut tables = self.inner.borrow_mut();
        let doomed_instances: HashSet<i64> = tables
            .instances
            .iter()
            .filter(|i| doomed.contains(&i.template_id))
            .map(|i| i.id)
            .collect();

        let before = tables.attendance.len();
        tables
            .attendance
            .retain(|a| !doomed_instances.contains(&a.instance_id));
        let attendance_removed = before - tables.attendance.len();

        let before = tables.instances.len();
        tables.instances.retain(|i| !doomed.contains(&i.template_id));
        let instances_removed = before - tables.instances.len();

        PurgeOutcome {
            attendance_removed,
            instances_removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LectureKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template() -> LectureTemplate {
        LectureTemplate {
            id: 0,
            subject: "CC".to_string(),
            kind: LectureKind::Theory,
            weekday: 1,
            start_time: "09:00".to_string(),
            end_time: "09:55".to_string(),
            room: "A-101".to_string(),
            faculty: "Staff".to_string(),
            branch: "CSE-DS".to_string(),
            division: "D1".to_string(),
            semester: 6,
            batch: None,
            is_active: true,
        }
    }

    #[test]
    fn bulk_inserts_are_idempotent() {
        let store = InMemoryStore::new();
        let template_id = store.add_template(template());
        let rows = vec![
            (template_id, date(2026, 2, 2)),
            (template_id, date(2026, 2, 9)),
        ];

        assert_eq!(store.insert_instances_if_absent(&rows), 2);
        assert_eq!(store.insert_instances_if_absent(&rows), 0);
        assert_eq!(store.instance_count(), 2);

        let ids = store.instance_ids_in_range(&[template_id], date(2026, 2, 1), date(2026, 2, 28));
        assert_eq!(store.insert_attendance_if_absent(7, &ids, true), 2);
        assert_eq!(store.insert_attendance_if_absent(7, &ids, true), 0);
        assert_eq!(store.attendance_count(), 2);
    }

    #[test]
    fn history_skips_rows_with_missing_instances() {
        let store = InMemoryStore::new();
        let template_id = store.add_template(template());
        let instance = store.create_instance(template_id, date(2026, 2, 2), InstanceStatus::Scheduled);
        store.insert_attendance_if_absent(7, &[instance.id, 9999], true);

        // The row pointing at instance 9999 is dropped, not fatal.
        let history = store.attendance_history(7);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].instance_id, instance.id);
    }

    #[test]
    fn upsert_creates_then_updates() {
        let store = InMemoryStore::new();
        let template_id = store.add_template(template());
        let instance = store.create_instance(template_id, date(2026, 2, 2), InstanceStatus::Scheduled);

        let update = AttendanceUpdate {
            is_ignored: Some(true),
            is_extra: Some(false),
            ..Default::default()
        };
        store.upsert_attendance(7, instance.id, false, &update);
        let history = store.attendance_history(7);
        assert!(!history[0].attended);
        assert!(history[0].is_ignored);

        let toggle = AttendanceUpdate {
            attended: Some(true),
            ..Default::default()
        };
        assert!(store.update_attendance(7, instance.id, &toggle));
        assert!(store.attendance_history(7)[0].attended);
        assert!(!store.update_attendance(8, instance.id, &toggle));
    }

    #[test]
    fn purge_removes_instances_and_attendance_together() {
        let store = InMemoryStore::new();
        let keep = store.add_template(template());
        let doomed = store.add_template(template());
        store.insert_instances_if_absent(&[(keep, date(2026, 2, 2)), (doomed, date(2026, 2, 2))]);
        let all = store.instance_ids_in_range(&[keep, doomed], date(2026, 2, 1), date(2026, 2, 28));
        store.insert_attendance_if_absent(7, &all, true);

        let outcome = store.purge_templates(&[doomed]);
        assert_eq!(outcome.instances_removed, 1);
        assert_eq!(outcome.attendance_removed, 1);
        assert_eq!(store.instance_count(), 1);
        assert_eq!(store.attendance_count(), 1);
    }
}
