pub mod controller;
pub mod router;
pub mod service;

pub use router::init_lesson_records_router;
pub use service::LessonRecordService;
