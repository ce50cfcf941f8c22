//! Picks the missing-note lessons that are worth reporting.

use std::collections::HashSet;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::config::DateRange;
use crate::db::{models::LessonRecord, Database};
use crate::lesson::{collapse_whitespace, normalize_time, should_exclude};

/// One reportable lesson still missing its note.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub date: NaiveDate,
    pub time: String,
    pub instructor: String,
    pub students: String,
    pub lesson_type: String,
    pub location: Option<String>,
}

/// Query the store for missing notes in the window, then dedup and apply
/// the exclusion policy. Excluded and duplicate rows stay in the store
/// untouched; they just never reach the report.
pub async fn select_missing(
    db: &Database,
    school: &str,
    range: DateRange,
) -> Result<Vec<ReportEntry>> {
    let records = db.missing_notes(school, range).await?;
    Ok(dedup_and_filter(records))
}

/// Dedup guards against the same logical lesson appearing under more than
/// one stored key after historic identity drift; the first occurrence (the
/// store's (date, time) order) wins.
fn dedup_and_filter(records: Vec<LessonRecord>) -> Vec<ReportEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for record in records {
        let time = normalize_time(&record.lesson_time);
        let students = collapse_whitespace(&record.students);
        let dedup_key = (
            record.instructor.trim().to_string(),
            record.lesson_date,
            time.clean.clone(),
            record.lesson_type.trim().to_string(),
            students.clone(),
        );
        if !seen.insert(dedup_key) {
            continue;
        }

        if should_exclude(&record.lesson_type, &record.students, &record.instructor) {
            continue;
        }

        entries.push(ReportEntry {
            date: record.lesson_date,
            time: time.clean,
            instructor: record.instructor.trim().to_string(),
            students,
            lesson_type: record.lesson_type.trim().to_string(),
            location: record.location.or(time.location),
        });
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::AttendanceStatus;

    fn record(key: &str, instructor: &str, time: &str) -> LessonRecord {
        LessonRecord {
            school: "westu-sor".into(),
            lesson_key: key.into(),
            instructor: instructor.into(),
            lesson_date: NaiveDate::parse_from_str("2025-06-19", "%Y-%m-%d").unwrap(),
            lesson_time: time.into(),
            lesson_type: "Private Lesson".into(),
            students: "Jane Doe".into(),
            location: None,
            note_completed: false,
            attendance_status: AttendanceStatus::Unknown,
            reminder_sent: false,
            reminder_count: 0,
            last_reminder_sent: None,
            last_checked: None,
        }
    }

    #[test]
    fn duplicate_records_collapse_to_one_entry() {
        // Same logical lesson stored twice under drifted keys, one of them
        // with the location still embedded in the time.
        let entries = dedup_and_filter(vec![
            record("k1", "Zach Jones", "3:00pm"),
            record("k2", "Zach Jones ", "3:00pm - Room 2"),
        ]);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time, "3:00pm");
    }

    #[test]
    fn excluded_lessons_are_dropped() {
        let mut admin = record("k1", "House", "3:00pm");
        admin.lesson_type = "Admin Time".into();
        let mut group = record("k2", "Zach Jones", "4:00pm");
        group.students = "Jane Doe, John Roe".into();

        let entries = dedup_and_filter(vec![
            admin,
            group,
            record("k3", "Zach Jones", "5:00pm"),
        ]);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time, "5:00pm");
    }

    #[test]
    fn students_are_whitespace_normalized() {
        let mut messy = record("k1", "Zach Jones", "3:00pm");
        messy.students = "Jane\n  Doe".into();
        let entries = dedup_and_filter(vec![messy]);
        assert_eq!(entries[0].students, "Jane Doe");
    }

    #[test]
    fn stored_location_wins_over_embedded_suffix() {
        let mut rec = record("k1", "Zach Jones", "3:00pm - Stage");
        rec.location = Some("Room 2".into());
        let entries = dedup_and_filter(vec![rec]);
        assert_eq!(entries[0].location.as_deref(), Some("Room 2"));
    }
}
