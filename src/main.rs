use attendance_engine::{sample, AttendanceService, EngineConfig, InMemoryStore};
use chrono::NaiveDate;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let store = InMemoryStore::new();
    let seeded = sample::seed(&store);
    let service = AttendanceService::new(store, EngineConfig::default());

    let today = NaiveDate::from_ymd_opt(2026, 2, 16).unwrap();

    println!("📅 Syncing timetable for Aarav (batch D11) up to {}...", today);
    let outcome = service.sync_schedule(seeded.student_d11, today)?;
    println!(
        "   {} projected lectures, {} instances created, {} attendance rows backfilled",
        outcome.occurrences, outcome.instances_created, outcome.attendance_created
    );

    // Mark the four oldest lectures as missed so the numbers move.
    let report = service.projection_report(seeded.student_d11, today)?;
    let mut missed = 0;
    for day in report.history.iter().rev() {
        for lecture in &day.lectures {
            if missed < 4 {
                service.toggle_attendance(seeded.student_d11, lecture.instance_id, false)?;
                missed += 1;
            }
        }
    }

    // And one DAV practical attended with the D12 batch on Feb 12.
    let extra_date = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
    service.add_extra_lecture(seeded.student_d11, seeded.dav_practical_d12, extra_date)?;

    let report = service.projection_report(seeded.student_d11, today)?;
    let current = report.current();
    println!(
        "\n✅ Current: {:.1}% overall, {} safe bunks, {} to attend, {} conducted",
        current.stats.attendance,
        current.stats.safe_bunks,
        current.stats.must_attend,
        current.stats.total_conducted
    );
    for subject in &current.subjects {
        println!(
            "   {:<6} {:<9} {:>2}/{:<2}  {:5.1}%  safe {}  need {}",
            subject.subject,
            subject.kind.to_string(),
            subject.present,
            subject.total,
            subject.percentage,
            subject.safe_bunks,
            subject.must_attend
        );
    }

    for range in report.ranges.iter().skip(1) {
        println!(
            "\n🎯 {} (up to {}): {} safe bunks, {} to attend{}",
            range.label,
            range.end,
            range.stats.safe_bunks,
            range.stats.must_attend,
            if range.stats.threshold_reachable {
                ""
            } else {
                "  [75% unreachable]"
            }
        );
        if let Some(window) = &range.bunk_window {
            match (window.start_date, window.end_date) {
                (Some(start), Some(end)) => println!(
                    "   longest safe streak: {} lectures, {} to {}",
                    window.lectures, start, end
                ),
                _ => println!("   no lecture can be safely skipped"),
            }
        }
    }

    Ok(())
}
