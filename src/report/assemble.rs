//! Turns selector output into the payload handed to the notifier.

use serde::{Deserialize, Serialize};

use crate::config::DateRange;
use crate::reconcile::CompletedEntry;
use crate::report::ReportEntry;

/// Which report sections a run should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSections {
    pub missing: bool,
    pub completed: bool,
}

impl Default for ReportSections {
    fn default() -> Self {
        Self {
            missing: true,
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub with_notes: usize,
    pub without_notes: usize,
}

/// Fully rendered report. Both bodies are built from the same sorted data
/// so the plain and HTML sides always agree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
    pub summary: ReportSummary,
}

/// Human-friendly school label: separator tokens become spaces, words get
/// title-cased ("westu-sor" -> "Westu Sor").
pub fn friendly_school_label(school: &str) -> String {
    school
        .split(['-', '_'])
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the report, or `None` when there is nothing to send: no section
/// selected, or every selected section empty.
pub fn assemble(
    school: &str,
    range: DateRange,
    mut missing: Vec<ReportEntry>,
    mut completed: Vec<CompletedEntry>,
    sections: ReportSections,
) -> Option<ReportPayload> {
    if !sections.missing {
        missing.clear();
    }
    if !sections.completed {
        completed.clear();
    }
    if missing.is_empty() && completed.is_empty() {
        return None;
    }

    missing.sort_by(|a, b| {
        (a.date, &a.time, &a.instructor).cmp(&(b.date, &b.time, &b.instructor))
    });
    completed.sort_by(|a, b| {
        (a.date, &a.time, &a.instructor).cmp(&(b.date, &b.time, &b.instructor))
    });

    let summary = ReportSummary {
        total: missing.len() + completed.len(),
        with_notes: completed.len(),
        without_notes: missing.len(),
    };

    let label = friendly_school_label(school);
    let subject = if completed.is_empty() {
        format!("Missing notes for {} ({} to {})", label, range.start, range.end)
    } else {
        format!("Lesson notes for {} ({} to {})", label, range.start, range.end)
    };

    let plain_body = render_plain(&missing, &completed, summary);
    let html_body = render_html(&missing, &completed, summary);

    Some(ReportPayload {
        subject,
        plain_body,
        html_body,
        summary,
    })
}

fn render_plain(
    missing: &[ReportEntry],
    completed: &[CompletedEntry],
    summary: ReportSummary,
) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Lessons checked: {} total, {} with notes, {} without notes.",
        summary.total, summary.with_notes, summary.without_notes
    ));
    lines.push(String::new());

    if !missing.is_empty() {
        lines.push("Lessons with missing notes:".to_string());
        lines.push(String::new());
        let mut current_date = None;
        let mut current_instructor = None;
        for entry in missing {
            if current_date != Some(entry.date) {
                lines.push(format!("Date: {}", entry.date));
                current_date = Some(entry.date);
                current_instructor = None;
            }
            if current_instructor.as_deref() != Some(entry.instructor.as_str()) {
                lines.push(format!("Instructor: {}", entry.instructor));
                current_instructor = Some(entry.instructor.clone());
            }
            let location = entry
                .location
                .as_deref()
                .map(|loc| format!(" [{loc}]"))
                .unwrap_or_default();
            lines.push(format!(
                "  {} - {} ({}){}",
                entry.time, entry.students, entry.lesson_type, location
            ));
        }
        lines.push(String::new());
    }

    if !completed.is_empty() {
        lines.push("Lessons with new notes:".to_string());
        lines.push(String::new());
        for entry in completed {
            lines.push(format!(
                "  {} {} - {} - {} ({}): {}",
                entry.date, entry.time, entry.instructor, entry.students,
                entry.lesson_type, entry.snippet
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

const TH_STYLE: &str =
    "border:1px solid #ccc;padding:8px;background:#f6f6f6;text-align:left;";
const TD_STYLE: &str = "border:1px solid #ccc;padding:8px;";

fn render_html(
    missing: &[ReportEntry],
    completed: &[CompletedEntry],
    summary: ReportSummary,
) -> String {
    let mut sections = Vec::new();

    if !missing.is_empty() {
        let rows: String = missing
            .iter()
            .map(|e| {
                format!(
                    "<tr><td style=\"{TD_STYLE}\">{}</td><td style=\"{TD_STYLE}\">{}</td>\
                     <td style=\"{TD_STYLE}\">{}</td><td style=\"{TD_STYLE}\">{}</td>\
                     <td style=\"{TD_STYLE}\">{}</td><td style=\"{TD_STYLE}\">{}</td></tr>",
                    e.date,
                    escape_html(&e.instructor),
                    escape_html(&e.time),
                    escape_html(&e.students),
                    escape_html(&e.lesson_type),
                    escape_html(e.location.as_deref().unwrap_or("")),
                )
            })
            .collect();
        sections.push(format!(
            "<p>Lessons with missing notes:</p>\
             <table style=\"border-collapse:collapse;width:100%;\"><thead><tr>\
             <th style=\"{TH_STYLE}\">Date</th><th style=\"{TH_STYLE}\">Instructor</th>\
             <th style=\"{TH_STYLE}\">Time</th><th style=\"{TH_STYLE}\">Student</th>\
             <th style=\"{TH_STYLE}\">Lesson Type</th><th style=\"{TH_STYLE}\">Location</th>\
             </tr></thead><tbody>{rows}</tbody></table>"
        ));
    }

    if !completed.is_empty() {
        let rows: String = completed
            .iter()
            .map(|e| {
                format!(
                    "<tr><td style=\"{TD_STYLE}\">{}</td><td style=\"{TD_STYLE}\">{}</td>\
                     <td style=\"{TD_STYLE}\">{}</td><td style=\"{TD_STYLE}\">{}</td>\
                     <td style=\"{TD_STYLE}\">{}</td><td style=\"{TD_STYLE}\">{}</td></tr>",
                    e.date,
                    escape_html(&e.instructor),
                    escape_html(&e.time),
                    escape_html(&e.students),
                    escape_html(&e.lesson_type),
                    escape_html(&e.snippet),
                )
            })
            .collect();
        sections.push(format!(
            "<p>Lessons with new notes:</p>\
             <table style=\"border-collapse:collapse;width:100%;\"><thead><tr>\
             <th style=\"{TH_STYLE}\">Date</th><th style=\"{TH_STYLE}\">Instructor</th>\
             <th style=\"{TH_STYLE}\">Time</th><th style=\"{TH_STYLE}\">Student</th>\
             <th style=\"{TH_STYLE}\">Lesson Type</th><th style=\"{TH_STYLE}\">Note</th>\
             </tr></thead><tbody>{rows}</tbody></table>"
        ));
    }

    format!(
        "<html><body style=\"font-family:Arial,sans-serif;font-size:14px;color:#222;\">\
         <p>Lessons checked: {} total, {} with notes, {} without notes.</p>{}</body></html>",
        summary.total,
        summary.with_notes,
        summary.without_notes,
        sections.join("")
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
