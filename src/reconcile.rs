//! Merges a batch of fresh observations into the lesson store.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::warn;
use serde::Serialize;

use crate::collector::RawObservation;
use crate::db::{models::LessonUpsert, repositories::LessonRepository, Database};
use crate::error::RunError;
use crate::lesson::{collapse_whitespace, has_usable_note, normalize_time, should_exclude, LessonKey};

/// Completed-note previews are capped at this many words.
pub const NOTE_SNIPPET_WORDS: usize = 10;

/// A reportable lesson whose note arrived in this batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedEntry {
    pub date: NaiveDate,
    pub time: String,
    pub instructor: String,
    pub students: String,
    pub lesson_type: String,
    pub location: Option<String>,
    pub snippet: String,
}

#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub completed: Vec<CompletedEntry>,
    pub processed: usize,
    pub skipped: usize,
}

struct Prepared {
    fields: LessonUpsert,
    completed: Option<CompletedEntry>,
}

pub struct Reconciler {
    db: Database,
}

impl Reconciler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Merge one scraped batch for one school. All upserts commit as a
    /// single transaction. A malformed observation is skipped and counted,
    /// never fatal; identities absent from the batch are left untouched.
    pub async fn reconcile(
        &self,
        school: &str,
        observations: Vec<RawObservation>,
        today: NaiveDate,
    ) -> Result<ReconcileOutcome> {
        let school = school.to_string();
        self.db
            .execute(move |conn| {
                let tx = conn
                    .transaction()
                    .context("failed to open reconcile transaction")?;
                let mut outcome = ReconcileOutcome::default();
                {
                    let repo = LessonRepository::new(&tx);
                    for obs in &observations {
                        match prepare(obs) {
                            Ok(prepared) => {
                                repo.upsert(&school, &prepared.fields, today)?;
                                outcome.processed += 1;
                                if let Some(entry) = prepared.completed {
                                    outcome.completed.push(entry);
                                }
                            }
                            Err(err) => {
                                warn!("Skipping observation for {school}: {err}");
                                outcome.skipped += 1;
                            }
                        }
                    }
                }
                tx.commit().context("failed to commit reconcile transaction")?;
                Ok(outcome)
            })
            .await
    }
}

fn prepare(obs: &RawObservation) -> std::result::Result<Prepared, RunError> {
    if obs.lesson_type.trim().is_empty() {
        return Err(RunError::MalformedObservation("lessonType"));
    }
    if obs.time.trim().is_empty() {
        return Err(RunError::MalformedObservation("time"));
    }
    let date = NaiveDate::parse_from_str(obs.date.trim(), "%Y-%m-%d")
        .map_err(|_| RunError::MalformedObservation("date"))?;

    let key = LessonKey::derive(obs);
    let normalized = normalize_time(&obs.time);
    let note_completed = has_usable_note(&obs.notes_text);

    let completed = if note_completed
        && !should_exclude(&obs.lesson_type, &obs.students, &obs.instructor)
    {
        Some(CompletedEntry {
            date,
            time: normalized.clean.clone(),
            instructor: obs.instructor.trim().to_string(),
            students: collapse_whitespace(&obs.students),
            lesson_type: obs.lesson_type.trim().to_string(),
            location: normalized.location.clone(),
            snippet: note_snippet(&obs.notes_text, NOTE_SNIPPET_WORDS),
        })
    } else {
        None
    };

    let fields = LessonUpsert {
        key,
        instructor: obs.instructor.trim().to_string(),
        lesson_date: date,
        lesson_time: normalized.clean,
        lesson_type: obs.lesson_type.trim().to_string(),
        students: obs.students.trim().to_string(),
        location: normalized.location,
        note_completed,
        attendance_status: obs.attendance_status,
    };

    Ok(Prepared { fields, completed })
}

fn note_snippet(note: &str, max_words: usize) -> String {
    let words: Vec<&str> = note.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        words.join(" ")
    }
}
