pub mod lesson;

pub use lesson::{LessonRecord, LessonUpsert};
