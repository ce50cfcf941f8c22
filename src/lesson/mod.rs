pub mod identity;
pub mod normalize;

pub use identity::LessonKey;
pub use normalize::{collapse_whitespace, has_usable_note, normalize_time, should_exclude, NormalizedTime};
