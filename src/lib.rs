//! Core engine of a student attendance tracker: expands weekly lecture
//! templates into dated schedules around an academic calendar, joins them
//! with recorded attendance, and projects percentages, safe-bunk budgets and
//! recovery deficits against the 75% policy line across several date ranges.
//!
//! Auth, HTTP and real persistence live outside; the [`store::Store`] trait
//! is the seam they plug into.

pub mod calendar;
pub mod error;
pub mod models;
pub mod planner;
pub mod resolver;
pub mod sample;
pub mod schedule;
pub mod service;
pub mod stats;
pub mod store;

pub use calendar::{AcademicCalendar, CalendarEvent, CalendarMonth, DateSpan, HolidayCalendar};
pub use error::EngineError;
pub use models::{
    Attendance, AttendanceView, AvailableLecture, BunkWindow, DayHistory, DayLecture,
    DedupOutcome, ElectivePair, InstanceStatus, LectureInstance, LectureKind, LectureTemplate,
    Occurrence, ProjectionReport, RangeReport, RangeStats, Student, SubjectKey, SubjectStats,
    SyncOutcome,
};
pub use service::{AttendanceService, EngineConfig, LectureRef, RangeCutoff};
pub use store::{AttendanceUpdate, InMemoryStore, PurgeOutcome, Store};
