//! Stable identity for a lesson instance across scrapes.

use serde::Serialize;

use crate::collector::RawObservation;

/// Natural key for one lesson instance within a school.
///
/// Instructor and note text are deliberately left out: both get corrected
/// between scrapes of the same physical lesson and must not fork the record.
/// The time component is the time as observed (before location stripping) so
/// re-scrapes of an unchanged schedule always land on the same key.
///
/// Known limitation: two distinct lessons sharing type, date, time, and
/// student list (different instructor) alias to one record and the later
/// write wins. A portal-assigned lesson id would close this; the scraper
/// does not currently expose one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LessonKey {
    pub lesson_type: String,
    pub date: String,
    pub time: String,
    pub students: String,
}

impl LessonKey {
    pub fn derive(obs: &RawObservation) -> Self {
        Self {
            lesson_type: obs.lesson_type.trim().to_string(),
            date: obs.date.trim().to_string(),
            time: obs.time.trim().to_string(),
            students: obs.students.trim().to_string(),
        }
    }

    /// Canonical storage encoding: a JSON array with fixed field order.
    /// JSON escaping keeps the key unambiguous even when a student name
    /// contains a delimiter-looking sequence.
    pub fn encode(&self) -> String {
        serde_json::to_string(&[
            self.lesson_type.as_str(),
            self.date.as_str(),
            self.time.as_str(),
            self.students.as_str(),
        ])
        .expect("serializing a string array cannot fail")
    }
}
