//! End-to-end: observation file -> reconcile -> selector -> report.

use chrono::NaiveDate;

use noteminder::collector::{Collector, FileCollector};
use noteminder::config::DateRange;
use noteminder::db::Database;
use noteminder::reconcile::Reconciler;
use noteminder::report::{assemble, select_missing, ReportSections};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn missing_note_flows_from_scrape_to_report() {
    let dir = tempfile::tempdir().unwrap();

    let handoff = serde_json::json!([
        {
            "school": "westu-sor",
            "date": "2025-06-19",
            "time": "3:00pm - Room 2",
            "instructor": "Zach Jones",
            "students": "Jane Doe",
            "lessonType": "Private Lesson",
            "notesText": "No notes",
            "attendanceStatus": "confirmed"
        },
        {
            "school": "westu-sor",
            "date": "2025-06-18",
            "time": "4:00pm",
            "instructor": "Amy Lee",
            "students": "John Roe",
            "lessonType": "Private Lesson",
            "notesText": "Solid work on the bridge section, tempo is much steadier now",
            "attendanceStatus": "complete"
        },
        {
            "school": "theheights-sor",
            "date": "2025-06-19",
            "time": "1:00pm",
            "instructor": "Pat Quinn",
            "students": "Alex Reed",
            "lessonType": "Private Lesson",
            "notesText": ""
        }
    ]);
    let path = dir.path().join("observations.json");
    std::fs::write(&path, handoff.to_string()).unwrap();

    let range = DateRange::new(date("2025-06-12"), date("2025-06-19"));
    let collector = FileCollector::new(path);
    let observations = collector.collect("westu-sor", &range).await.unwrap();
    assert_eq!(observations.len(), 2, "other school filtered out");

    let db = Database::new(dir.path().join("lessons.db")).unwrap();
    let reconciler = Reconciler::new(db.clone());
    let outcome = reconciler
        .reconcile("westu-sor", observations, date("2025-06-19"))
        .await
        .unwrap();
    assert_eq!(outcome.processed, 2);
    assert_eq!(outcome.completed.len(), 1);

    let missing = select_missing(&db, "westu-sor", range).await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].time, "3:00pm");
    assert_eq!(missing[0].location.as_deref(), Some("Room 2"));
    assert_eq!(missing[0].instructor, "Zach Jones");

    let payload = assemble(
        "westu-sor",
        range,
        missing,
        outcome.completed,
        ReportSections {
            missing: true,
            completed: true,
        },
    )
    .unwrap();

    assert_eq!(payload.summary.total, 2);
    assert_eq!(payload.summary.with_notes, 1);
    assert_eq!(payload.summary.without_notes, 1);
    assert!(payload.subject.contains("Westu Sor"));
    assert!(payload.plain_body.contains("Jane Doe"));
    assert!(payload.plain_body.contains("Solid work"));
    assert!(payload.html_body.contains("Room 2"));
}

#[tokio::test]
async fn rerunning_the_same_handoff_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let handoff = serde_json::json!([
        {
            "school": "westu-sor",
            "date": "2025-06-19",
            "time": "3:00pm - Room 2",
            "instructor": "Zach Jones",
            "students": "Jane Doe",
            "lessonType": "Private Lesson",
            "notesText": "Great progress on the set list"
        }
    ]);
    let path = dir.path().join("observations.json");
    std::fs::write(&path, handoff.to_string()).unwrap();

    let range = DateRange::new(date("2025-06-12"), date("2025-06-19"));
    let collector = FileCollector::new(path);
    let db = Database::new(dir.path().join("lessons.db")).unwrap();
    let reconciler = Reconciler::new(db.clone());

    for _ in 0..2 {
        let observations = collector.collect("westu-sor", &range).await.unwrap();
        reconciler
            .reconcile("westu-sor", observations, date("2025-06-19"))
            .await
            .unwrap();
    }

    assert_eq!(db.lesson_count("westu-sor").await.unwrap(), 1);
    let missing = select_missing(&db, "westu-sor", range).await.unwrap();
    assert!(missing.is_empty());
}
