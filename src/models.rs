use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery kind of a lecture slot. Serialized uppercase to match the
/// timetable documents ("THEORY" / "PRACTICAL").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LectureKind {
    Theory,
    Practical,
}

impl fmt::Display for LectureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LectureKind::Theory => write!(f, "THEORY"),
            LectureKind::Practical => write!(f, "PRACTICAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstanceStatus {
    Scheduled,
    Extra,
    Cancelled,
}

/// A recurring weekly class slot. Immutable once published; a changed slot is
/// a new template with the old one deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LectureTemplate {
    pub id: i64,
    pub subject: String,
    pub kind: LectureKind,
    /// 1 = Monday .. 7 = Sunday.
    pub weekday: u32,
    /// Zero-padded "HH:MM".
    pub start_time: String,
    pub end_time: String,
    pub room: String,
    pub faculty: String,
    pub branch: String,
    pub division: String,
    pub semester: u8,
    /// Batch label like "D11". None (or empty) means the whole class attends.
    pub batch: Option<String>,
    pub is_active: bool,
}

/// One dated occurrence of a template, unique per (template, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LectureInstance {
    pub id: i64,
    pub template_id: i64,
    pub date: NaiveDate,
    pub status: InstanceStatus,
}

/// A student's record against one lecture instance, unique per
/// (student, instance). Rows are created attended-by-default on sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub student_id: i64,
    pub instance_id: i64,
    pub attended: bool,
    /// Excluded from totals (template cancelled for this student).
    pub is_ignored: bool,
    /// Counted on top of the template projection (another batch's session).
    pub is_extra: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub branch: String,
    pub division: String,
    pub semester: u8,
    /// Sub-division id matched against template batch suffixes ("1" -> "D11").
    pub sub_division: String,
    pub elective_choice1: Option<String>,
    pub elective_choice2: Option<String>,
}

/// One elective slot offered for a (branch, semester): a pair of subject
/// names the student picks from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectivePair {
    pub branch: String,
    pub semester: u8,
    pub first: Option<String>,
    pub second: Option<String>,
}

/// Grouping key for all per-subject arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubjectKey {
    pub subject: String,
    pub kind: LectureKind,
}

impl SubjectKey {
    pub fn new(subject: &str, kind: LectureKind) -> SubjectKey {
        SubjectKey {
            subject: subject.to_string(),
            kind,
        }
    }

    pub fn of(template: &LectureTemplate) -> SubjectKey {
        SubjectKey::new(&template.subject, template.kind)
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.subject, self.kind)
    }
}

/// A projected lecture on a concrete date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub template_id: i64,
    pub subject: String,
    pub kind: LectureKind,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
    pub faculty: String,
}

impl Occurrence {
    pub fn of(template: &LectureTemplate, date: NaiveDate) -> Occurrence {
        Occurrence {
            template_id: template.id,
            subject: template.subject.clone(),
            kind: template.kind,
            date,
            start_time: template.start_time.clone(),
            end_time: template.end_time.clone(),
            room: template.room.clone(),
            faculty: template.faculty.clone(),
        }
    }

    pub fn key(&self) -> SubjectKey {
        SubjectKey::new(&self.subject, self.kind)
    }
}

/// An attendance row joined with its instance date and template details,
/// the shape every aggregation works from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceView {
    pub attendance_id: i64,
    pub instance_id: i64,
    pub template_id: i64,
    pub date: NaiveDate,
    pub subject: String,
    pub kind: LectureKind,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
    pub faculty: String,
    pub attended: bool,
    pub is_ignored: bool,
    pub is_extra: bool,
}

impl AttendanceView {
    pub fn key(&self) -> SubjectKey {
        SubjectKey::new(&self.subject, self.kind)
    }

    pub fn key_matches(&self, key: &SubjectKey) -> bool {
        self.subject == key.subject && self.kind == key.kind
    }
}

/// Per-subject numbers for one policy range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectStats {
    pub subject: String,
    pub kind: LectureKind,
    /// Projected range total after extra/ignored adjustments.
    pub total: i64,
    pub present: i64,
    pub conducted_so_far: i64,
    pub percentage: f64,
    pub safe_bunks: i64,
    pub must_attend: i64,
    /// False means 75% is out of reach for this range even with perfect
    /// attendance from here on.
    pub threshold_reachable: bool,
}

/// Aggregate numbers for one policy range, summed across subjects before
/// any division.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeStats {
    pub attendance: f64,
    pub safe_bunks: i64,
    pub must_attend: i64,
    pub total_missed: i64,
    pub total_conducted: i64,
    pub threshold_reachable: bool,
}

/// The longest contiguous run of future lectures that can all be skipped
/// without pushing any subject past its safe-bunk budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BunkWindow {
    pub lectures: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub run: Vec<Occurrence>,
}

impl BunkWindow {
    pub fn empty() -> BunkWindow {
        BunkWindow {
            lectures: 0,
            start_date: None,
            end_date: None,
            run: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lectures == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeReport {
    pub label: String,
    pub end: NaiveDate,
    pub stats: RangeStats,
    pub subjects: Vec<SubjectStats>,
    /// Present for future ranges only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bunk_window: Option<BunkWindow>,
}

/// One lecture line in the day schedule / history views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayLecture {
    pub instance_id: i64,
    pub attendance_id: i64,
    pub subject: String,
    pub kind: LectureKind,
    pub time: String,
    pub room: String,
    pub faculty: String,
    pub attended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHistory {
    pub date: NaiveDate,
    pub lectures: Vec<DayLecture>,
}

/// Everything the dashboard needs for one student: all policy ranges
/// (current first), today's lectures and the full history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionReport {
    pub ranges: Vec<RangeReport>,
    pub schedule: Vec<DayLecture>,
    pub history: Vec<DayHistory>,
}

impl ProjectionReport {
    /// The "Current" range; always the first entry.
    pub fn current(&self) -> &RangeReport {
        &self.ranges[0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncOutcome {
    pub occurrences: usize,
    pub instances_created: usize,
    pub attendance_created: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DedupOutcome {
    pub removed_attendance: usize,
    pub removed_instances: usize,
    pub cleaned_templates: Vec<i64>,
    pub log: Vec<String>,
}

/// A template offered on some date, flagged with whether it belongs to the
/// student's own batch. Feeds the "attend another batch's session" picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailableLecture {
    pub template_id: i64,
    pub subject: String,
    pub kind: LectureKind,
    pub start_time: String,
    pub end_time: String,
    pub faculty: String,
    pub room: String,
    pub batch: Option<String>,
    pub is_my_batch: bool,
}
