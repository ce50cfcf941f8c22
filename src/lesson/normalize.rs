//! Cleanup rules for the free-text fields the scraper hands over.

/// Note bodies the portal renders when nothing was written.
const ABSENT_NOTE_SENTINELS: &[&str] = &["no notes", "nan", "none"];

/// Lesson types that are scheduling blocks, not teachable lessons.
const EXCLUDED_TYPE_MARKERS: &[&str] = &["admin", "meeting"];

/// Placeholder instructor names used for house/admin calendar lanes.
const EXCLUDED_INSTRUCTOR_MARKERS: &[&str] = &["admin", "trial", "rookies"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTime {
    pub clean: String,
    pub location: Option<String>,
}

/// Split a scraped schedule time into the time proper and the room suffix.
///
/// The portal renders times as `"3:00pm - Room 2"` and sometimes appends an
/// `" on <weekday>"` clause. The split happens on the last `" - "` so room
/// names containing a dash stay intact. Feeding the returned `clean` back in
/// is a no-op.
pub fn normalize_time(raw: &str) -> NormalizedTime {
    let trimmed = raw.trim();

    let (time_part, location) = match trimmed.rfind(" - ") {
        Some(idx) => {
            let suffix = trimmed[idx + 3..].trim();
            let location = if suffix.is_empty() {
                None
            } else {
                Some(suffix.to_string())
            };
            (&trimmed[..idx], location)
        }
        None => (trimmed, None),
    };

    let time_part = match time_part.find(" on ") {
        Some(idx) => &time_part[..idx],
        None => time_part,
    };

    NormalizedTime {
        clean: time_part.trim().to_string(),
        location,
    }
}

/// True iff the note body carries real content. Empty-after-trim text and
/// the portal's absence sentinels count as no note.
pub fn has_usable_note(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    !ABSENT_NOTE_SENTINELS.contains(&lowered.as_str())
}

/// Reporting policy: only individual lessons with a real instructor are
/// reportable. Admin/meeting blocks, group lessons (comma in the student
/// list), and placeholder or admin/trial/rookies instructors are dropped
/// from reports (they stay in the store untouched).
pub fn should_exclude(lesson_type: &str, students: &str, instructor: &str) -> bool {
    let type_lower = lesson_type.to_lowercase();
    if EXCLUDED_TYPE_MARKERS.iter().any(|m| type_lower.contains(m)) {
        return true;
    }

    if students.contains(',') {
        return true;
    }

    let instructor = instructor.trim().to_lowercase();
    if !instructor.chars().any(|c| c.is_alphabetic()) {
        return true;
    }
    EXCLUDED_INSTRUCTOR_MARKERS
        .iter()
        .any(|m| instructor.contains(m))
}

/// Collapse runs of whitespace to single spaces and trim. Student lists come
/// out of the scraper with stray newlines in them.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_location_off_schedule_time() {
        let result = normalize_time("3:00pm - Room 2");
        assert_eq!(result.clean, "3:00pm");
        assert_eq!(result.location.as_deref(), Some("Room 2"));
    }

    #[test]
    fn splits_on_last_separator() {
        let result = normalize_time("3:00pm - Practice Room - B");
        assert_eq!(result.clean, "3:00pm - Practice Room");
        assert_eq!(result.location.as_deref(), Some("B"));
    }

    #[test]
    fn strips_weekday_clause() {
        let result = normalize_time("3:00pm on Thursday - Room 2");
        assert_eq!(result.clean, "3:00pm");
        assert_eq!(result.location.as_deref(), Some("Room 2"));
    }

    #[test]
    fn plain_time_passes_through() {
        let result = normalize_time("  3:00pm ");
        assert_eq!(result.clean, "3:00pm");
        assert_eq!(result.location, None);
    }

    #[test]
    fn normalization_is_idempotent_on_clean_output() {
        for raw in ["3:00pm - Room 2", "3:00pm on Thursday", "3:00pm", "  4:30pm - Stage "] {
            let first = normalize_time(raw);
            let second = normalize_time(&first.clean);
            assert_eq!(second.clean, first.clean, "raw input: {raw:?}");
            assert_eq!(second.location, None, "raw input: {raw:?}");
        }
    }

    #[test]
    fn note_sentinels_are_not_usable() {
        assert!(!has_usable_note(""));
        assert!(!has_usable_note("   "));
        assert!(!has_usable_note("No notes"));
        assert!(!has_usable_note("NaN"));
        assert!(!has_usable_note("none"));
    }

    #[test]
    fn real_notes_are_usable() {
        assert!(has_usable_note("Worked on scales"));
        assert!(has_usable_note("  n/a or so we thought "));
    }

    #[test]
    fn exclusion_policy_truth_table() {
        // Admin block with a placeholder instructor name.
        assert!(should_exclude("Admin Time", "", "House"));
        // Individual lesson, real instructor.
        assert!(!should_exclude("Private Lesson", "Jane Doe", "Zach Jones"));
        // Group lesson.
        assert!(should_exclude("Private Lesson", "Jane Doe, John Roe", "Zach Jones"));
        // Meetings are never reportable.
        assert!(should_exclude("Staff Meeting", "Jane Doe", "Zach Jones"));
        // Instructor placeholders.
        assert!(should_exclude("Private Lesson", "Jane Doe", "---"));
        assert!(should_exclude("Private Lesson", "Jane Doe", ""));
        assert!(should_exclude("Private Lesson", "Jane Doe", "Trial Desk"));
        assert!(should_exclude("Private Lesson", "Jane Doe", "Rookies Lane"));
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(collapse_whitespace("Jane\n Doe"), "Jane Doe");
        assert_eq!(collapse_whitespace("  Jane   Doe  "), "Jane Doe");
    }
}
