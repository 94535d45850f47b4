//! Seeded demo data: one CSE-DS division timetable, its academic calendar
//! and two students in different batches.

use crate::calendar::AcademicCalendar;
use crate::models::{ElectivePair, LectureKind, LectureTemplate, Student};
use crate::store::InMemoryStore;
use serde_json::json;

pub const BRANCH: &str = "Computer Science and Engineering (Data Science)";

pub struct SampleData {
    pub student_d11: i64,
    pub student_d12: i64,
    /// The other batch's DAV practical, handy for extra-lecture demos.
    pub dav_practical_d12: i64,
}

fn sample_calendar() -> AcademicCalendar {
    let document = json!({
        "academicCalendar": {
            "months": [
                {
                    "month": "January",
                    "year": 2026,
                    "events": [
                        { "date": 26, "type": "Holiday", "name": "Republic Day" }
                    ]
                },
                {
                    "month": "February",
                    "year": 2026,
                    "events": [
                        { "date": 15, "type": "Event", "day": "Sunday", "name": "Alumni Meet" },
                        { "date": 19, "type": "Holiday", "name": "Chhatrapati Shivaji Maharaj Jayanti" }
                    ]
                },
                {
                    "month": "March",
                    "year": 2026,
                    "events": [
                        { "date": 4, "type": "Holiday", "name": "Dhulivandan" }
                    ]
                },
                {
                    "month": "April",
                    "year": 2026,
                    "events": [
                        { "date": 14, "type": "Holiday", "name": "Dr. Ambedkar Jayanti" }
                    ]
                },
                {
                    "month": "May",
                    "year": 2026,
                    "events": [
                        { "date": 1, "type": "Holiday", "name": "Maharashtra Day" }
                    ]
                }
            ]
        }
    });
    AcademicCalendar::parse("2025-2026", &document).unwrap()
}

/// Fills the store and returns the ids the demo needs.
pub fn seed(store: &InMemoryStore) -> SampleData {
    store.add_calendar(sample_calendar());

    let template = |subject: &str,
                    kind: LectureKind,
                    weekday: u32,
                    start: &str,
                    end: &str,
                    room: &str,
                    faculty: &str,
                    batch: Option<&str>| LectureTemplate {
        id: 0,
        subject: subject.to_string(),
        kind,
        weekday,
        start_time: start.to_string(),
        end_time: end.to_string(),
        room: room.to_string(),
        faculty: faculty.to_string(),
        branch: BRANCH.to_string(),
        division: "D1".to_string(),
        semester: 6,
        batch: batch.map(|b| b.to_string()),
        is_active: true,
    };

    use LectureKind::{Practical, Theory};

    // Core theory, whole class.
    store.add_template(template("DAV", Theory, 1, "09:00", "09:55", "A-301", "Dr. Deshmukh", None));
    store.add_template(template("DAV", Theory, 3, "10:05", "11:00", "A-301", "Dr. Deshmukh", None));
    store.add_template(template("DAV", Theory, 4, "09:00", "09:55", "A-301", "Dr. Deshmukh", None));
    store.add_template(template("CC", Theory, 2, "09:00", "09:55", "A-302", "Prof. Iyer", None));
    store.add_template(template("CC", Theory, 5, "10:05", "11:00", "A-302", "Prof. Iyer", None));
    store.add_template(template("SPM", Theory, 1, "10:05", "11:00", "A-301", "Prof. Kulkarni", None));
    store.add_template(template("SPM", Theory, 4, "11:00", "11:55", "A-301", "Prof. Kulkarni", None));

    // Batched practicals.
    store.add_template(template("DAV", Practical, 2, "14:05", "16:00", "Lab-2", "Dr. Deshmukh", Some("D11")));
    let dav_practical_d12 =
        store.add_template(template("DAV", Practical, 4, "14:05", "16:00", "Lab-2", "Dr. Deshmukh", Some("D12")));
    store.add_template(template("CC", Practical, 3, "14:05", "16:00", "Lab-1", "Prof. Iyer", Some("D11")));
    store.add_template(template("CC", Practical, 5, "14:05", "16:00", "Lab-1", "Prof. Iyer", Some("D12")));

    // Elective slot: NLP vs AR-VR share the theory hours.
    store.add_template(template("NLP", Theory, 3, "11:00", "11:55", "A-303", "Dr. Nair", None));
    store.add_template(template("NLP", Theory, 5, "09:00", "09:55", "A-303", "Dr. Nair", None));
    store.add_template(template("AR-VR", Theory, 3, "11:00", "11:55", "A-304", "Prof. Bose", None));
    store.add_template(template("AR-VR", Theory, 5, "09:00", "09:55", "A-304", "Prof. Bose", None));
    // Only one NLP practical section was ever filed.
    store.add_template(template("NLP", Practical, 1, "14:05", "16:00", "Lab-3", "Dr. Nair", Some("D11")));

    store.add_elective(ElectivePair {
        branch: BRANCH.to_string(),
        semester: 6,
        first: Some("NLP".to_string()),
        second: Some("AR-VR".to_string()),
    });

    let student_d11 = store.add_student(Student {
        id: 0,
        name: "Aarav Shah".to_string(),
        branch: BRANCH.to_string(),
        division: "D1".to_string(),
        semester: 6,
        sub_division: "1".to_string(),
        elective_choice1: Some("NLP".to_string()),
        elective_choice2: None,
    });
    let student_d12 = store.add_student(Student {
        id: 0,
        name: "Diya Patel".to_string(),
        branch: BRANCH.to_string(),
        division: "D1".to_string(),
        semester: 6,
        sub_division: "2".to_string(),
        elective_choice1: Some("AR-VR".to_string()),
        elective_choice2: None,
    });

    SampleData {
        student_d11,
        student_d12,
        dav_practical_d12,
    }
}
