//! # Karnameh CLI
//!
//! Tools for development and support:
//!
//! - [`seeder`]: fills the database with generated schools and a school year
//!   of lesson records
//! - [`offline`]: computes report cards from an exported JSON file
//!
//! ## Usage
//!
//! ```ignore
//! use karnameh_cli::seeder::{SeedConfig, seed_all};
//! use karnameh_grading::SchoolYear;
//!
//! let config = SeedConfig::new(2, SchoolYear(1403));
//! seed_all(&pool, config).await?;
//! ```

pub mod offline;
pub mod seeder;
