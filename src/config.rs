use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::notify::Recipients;
use crate::report::ReportSections;

/// Inclusive calendar-date window for one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Default reporting window: the 7 days ending today.
    pub fn trailing_week(today: NaiveDate) -> Self {
        Self {
            start: today - Duration::days(7),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Everything one run needs, loaded from a JSON file and overridable from
/// the command line. Passed into components explicitly; there are no
/// process-wide singletons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub school: String,
    pub db_path: PathBuf,
    /// Directory the store is synchronized to before and after each run.
    /// None disables remote sync.
    pub remote_dir: Option<PathBuf>,
    pub recipients: Recipients,
    pub sections: ReportSections,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            school: String::new(),
            db_path: PathBuf::from("noteminder.db"),
            remote_dir: None,
            recipients: Recipients::default(),
            sections: ReportSections::default(),
        }
    }
}

impl RunConfig {
    pub fn load(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}
