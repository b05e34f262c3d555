pub mod assessment_weights;
pub mod calendar;
pub mod lesson_records;
pub mod reports;
