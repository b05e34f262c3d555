pub mod controller;
pub mod router;
pub mod service;

pub use router::init_assessment_weights_router;
pub use service::AssessmentWeightService;
