use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::collector::AttendanceStatus;
use crate::config::DateRange;
use crate::db::{
    connection::Database,
    helpers::{parse_date, parse_optional_date, parse_optional_datetime, DATE_FORMAT},
    models::{LessonRecord, LessonUpsert},
};

const SELECT_COLUMNS: &str = "school, lesson_key, instructor, lesson_date, lesson_time, \
     lesson_type, students, location, note_completed, attendance_status, \
     reminder_sent, reminder_count, last_reminder_sent, last_checked";

fn row_to_lesson(row: &Row) -> Result<LessonRecord> {
    let lesson_date: String = row.get("lesson_date")?;
    let attendance_status: String = row.get("attendance_status")?;
    let last_reminder_sent: Option<String> = row.get("last_reminder_sent")?;
    let last_checked: Option<String> = row.get("last_checked")?;

    Ok(LessonRecord {
        school: row.get("school")?,
        lesson_key: row.get("lesson_key")?,
        instructor: row.get("instructor")?,
        lesson_date: parse_date(&lesson_date, "lesson_date")?,
        lesson_time: row.get("lesson_time")?,
        lesson_type: row.get("lesson_type")?,
        students: row.get("students")?,
        location: row.get("location")?,
        note_completed: row.get("note_completed")?,
        attendance_status: AttendanceStatus::parse(&attendance_status),
        reminder_sent: row.get("reminder_sent")?,
        reminder_count: row.get("reminder_count")?,
        last_reminder_sent: parse_optional_datetime(last_reminder_sent, "last_reminder_sent")?,
        last_checked: parse_optional_date(last_checked, "last_checked")?,
    })
}

pub struct LessonRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LessonRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or update one lesson by its natural key. Observed fields and
    /// `last_checked` are overwritten; `location` only ever moves from
    /// unknown to known (an observation without a location never erases a
    /// stored one).
    pub fn upsert(&self, school: &str, fields: &LessonUpsert, today: NaiveDate) -> Result<()> {
        let location = fields
            .location
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty());

        self.conn.execute(
            "INSERT INTO lessons (school, lesson_key, instructor, lesson_date, lesson_time,
                                  lesson_type, students, location, note_completed,
                                  attendance_status, last_checked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(school, lesson_key) DO UPDATE SET
                 instructor = excluded.instructor,
                 lesson_date = excluded.lesson_date,
                 lesson_time = excluded.lesson_time,
                 lesson_type = excluded.lesson_type,
                 students = excluded.students,
                 location = COALESCE(excluded.location, lessons.location),
                 note_completed = excluded.note_completed,
                 attendance_status = excluded.attendance_status,
                 last_checked = excluded.last_checked",
            params![
                school,
                fields.key.encode(),
                fields.instructor,
                fields.lesson_date.format(DATE_FORMAT).to_string(),
                fields.lesson_time,
                fields.lesson_type,
                fields.students,
                location,
                fields.note_completed,
                fields.attendance_status.as_str(),
                today.format(DATE_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    /// Lessons still missing a note for one school, restricted to an
    /// inclusive date window, ordered by (date, time).
    pub fn missing_notes(&self, school: &str, range: DateRange) -> Result<Vec<LessonRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS}
             FROM lessons
             WHERE school = ?1
               AND note_completed = 0
               AND lesson_date >= ?2
               AND lesson_date <= ?3
             ORDER BY lesson_date, lesson_time"
        ))?;

        let mut rows = stmt.query(params![
            school,
            range.start.format(DATE_FORMAT).to_string(),
            range.end.format(DATE_FORMAT).to_string(),
        ])?;

        let mut lessons = Vec::new();
        while let Some(row) = rows.next()? {
            lessons.push(row_to_lesson(row)?);
        }
        Ok(lessons)
    }

    pub fn get(&self, school: &str, encoded_key: &str) -> Result<Option<LessonRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM lessons WHERE school = ?1 AND lesson_key = ?2"
        ))?;

        let mut rows = stmt.query(params![school, encoded_key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_lesson(row)?)),
            None => Ok(None),
        }
    }

    pub fn count(&self, school: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM lessons WHERE school = ?1",
                params![school],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);
        Ok(count)
    }
}

// Async wrappers over the repository for callers holding a Database handle.
impl Database {
    pub async fn missing_notes(
        &self,
        school: &str,
        range: DateRange,
    ) -> Result<Vec<LessonRecord>> {
        let school = school.to_string();
        self.execute(move |conn| LessonRepository::new(conn).missing_notes(&school, range))
            .await
    }

    pub async fn lesson(&self, school: &str, encoded_key: &str) -> Result<Option<LessonRecord>> {
        let school = school.to_string();
        let encoded_key = encoded_key.to_string();
        self.execute(move |conn| LessonRepository::new(conn).get(&school, &encoded_key))
            .await
    }

    pub async fn lesson_count(&self, school: &str) -> Result<i64> {
        let school = school.to_string();
        self.execute(move |conn| LessonRepository::new(conn).count(&school))
            .await
    }
}
