pub mod lessons;

pub use lessons::LessonRepository;
