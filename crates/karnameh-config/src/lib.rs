//! # Karnameh Config
//!
//! Configuration types for the Karnameh API, loaded from environment variables:
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`grading`]: School time zone and default school year for reports
//!
//! # Example
//!
//! ```ignore
//! use karnameh_config::{CorsConfig, GradingConfig};
//!
//! let cors_config = CorsConfig::from_env();
//! let grading_config = GradingConfig::from_env();
//! ```

pub mod cors;
pub mod grading;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use grading::GradingConfig;
