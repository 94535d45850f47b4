use chrono::NaiveDate;
use std::error::Error;
use std::fmt;

/// Failure kinds surfaced by the engine. A missing calendar is not here
/// (it degrades to an empty holiday set), and an unreachable threshold is a
/// result state on the stats, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    StudentNotFound(i64),
    TemplateNotFound(i64),
    /// No instance row with this id.
    InstanceNotFound(i64),
    /// Nothing was ever scheduled for this (template, date).
    InstanceNotScheduled { template_id: i64, date: NaiveDate },
    AttendanceNotFound { student_id: i64, instance_id: i64 },
    /// Reversed bounds, or a span longer than the iteration safety cap.
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::StudentNotFound(id) => write!(f, "student {} not found", id),
            EngineError::TemplateNotFound(id) => write!(f, "lecture template {} not found", id),
            EngineError::InstanceNotFound(id) => write!(f, "lecture instance {} not found", id),
            EngineError::InstanceNotScheduled { template_id, date } => {
                write!(f, "no lecture instance for template {} on {}", template_id, date)
            }
            EngineError::AttendanceNotFound {
                student_id,
                instance_id,
            } => write!(
                f,
                "no attendance row for student {} on instance {}",
                student_id, instance_id
            ),
            EngineError::InvalidRange { start, end } => {
                write!(f, "invalid date range {} ..= {}", start, end)
            }
        }
    }
}

impl Error for EngineError {}
