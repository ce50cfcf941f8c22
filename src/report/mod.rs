pub mod assemble;
pub mod selector;

pub use assemble::{assemble, friendly_school_label, ReportPayload, ReportSections, ReportSummary};
pub use selector::{select_missing, ReportEntry};
