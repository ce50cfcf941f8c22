//! Contract with the external portal scraper.
//!
//! The scraper logs into the scheduling portal with a browser, walks the
//! calendar for a date range, and hands over one `RawObservation` per lesson
//! instance it saw. Everything here treats that data as best-effort text:
//! absent fields are ordinary, not errors.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Confirmed,
    Canceled,
    Complete,
    NoShow,
    Pending,
    Booked,
    Unknown,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        AttendanceStatus::Unknown
    }
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Confirmed => "confirmed",
            AttendanceStatus::Canceled => "canceled",
            AttendanceStatus::Complete => "complete",
            AttendanceStatus::NoShow => "no-show",
            AttendanceStatus::Pending => "pending",
            AttendanceStatus::Booked => "booked",
            AttendanceStatus::Unknown => "unknown",
        }
    }

    /// Best-effort parse of scraped status text. The portal renders both
    /// "canceled" and "cancelled"; anything unrecognized maps to Unknown.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "confirmed" => AttendanceStatus::Confirmed,
            "canceled" | "cancelled" => AttendanceStatus::Canceled,
            "complete" | "completed" => AttendanceStatus::Complete,
            "no show" | "no-show" | "noshow" => AttendanceStatus::NoShow,
            "pending" => AttendanceStatus::Pending,
            "booked" => AttendanceStatus::Booked,
            _ => AttendanceStatus::Unknown,
        }
    }
}

/// One scraped lesson instance, exactly as observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObservation {
    pub school: String,
    /// ISO calendar date of the lesson.
    pub date: String,
    /// Free-text schedule time; may carry a trailing " - <location>" suffix
    /// and/or an " on <weekday>" clause.
    pub time: String,
    #[serde(default)]
    pub instructor: String,
    /// Comma-separated student names; empty for admin blocks.
    #[serde(default)]
    pub students: String,
    pub lesson_type: String,
    #[serde(default)]
    pub notes_text: String,
    #[serde(default)]
    pub attendance_status: AttendanceStatus,
}

/// Produces the observations for one school and date window. Failure here
/// is fatal for the run; retries and timeouts live behind this seam.
pub trait Collector {
    fn collect(
        &self,
        school: &str,
        range: &DateRange,
    ) -> impl std::future::Future<Output = Result<Vec<RawObservation>>> + Send;
}

/// Reads the scraper's JSON handoff file and filters it down to the
/// requested school and window.
pub struct FileCollector {
    path: PathBuf,
}

impl FileCollector {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Collector for FileCollector {
    async fn collect(&self, school: &str, range: &DateRange) -> Result<Vec<RawObservation>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read observations from {}", self.path.display()))?;
        let all: Vec<RawObservation> = serde_json::from_str(&contents)
            .with_context(|| format!("invalid observation file {}", self.path.display()))?;

        Ok(all
            .into_iter()
            .filter(|obs| {
                if obs.school != school {
                    return false;
                }
                match chrono::NaiveDate::parse_from_str(obs.date.trim(), "%Y-%m-%d") {
                    Ok(date) => range.contains(date),
                    // Let the reconciler count it as malformed rather than
                    // dropping it silently here.
                    Err(_) => true,
                }
            })
            .collect())
    }
}
