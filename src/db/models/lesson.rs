//! Persisted lesson state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::AttendanceStatus;
use crate::lesson::LessonKey;

/// One stored lesson instance. At most one record exists per
/// (school, lesson_key); records are created on first observation, updated
/// on every later one, and never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRecord {
    pub school: String,
    /// Encoded `LessonKey` (see `LessonKey::encode`).
    pub lesson_key: String,
    pub instructor: String,
    pub lesson_date: NaiveDate,
    /// Normalized schedule time; the location suffix lives in `location`.
    pub lesson_time: String,
    pub lesson_type: String,
    pub students: String,
    pub location: Option<String>,
    pub note_completed: bool,
    pub attendance_status: AttendanceStatus,
    // Reserved for reminder escalation; maintained but not driven by the
    // reconciliation path.
    pub reminder_sent: bool,
    pub reminder_count: i64,
    pub last_reminder_sent: Option<DateTime<Utc>>,
    pub last_checked: Option<NaiveDate>,
}

/// Field set the reconciler writes for one observation.
#[derive(Debug, Clone)]
pub struct LessonUpsert {
    pub key: LessonKey,
    pub instructor: String,
    pub lesson_date: NaiveDate,
    pub lesson_time: String,
    pub lesson_type: String,
    pub students: String,
    pub location: Option<String>,
    pub note_completed: bool,
    pub attendance_status: AttendanceStatus,
}
