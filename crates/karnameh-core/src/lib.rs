//! # Karnameh Core
//!
//! Core types, errors, and utilities for the Karnameh API.
//!
//! This crate provides foundational types used throughout the Karnameh workspace:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Page-based pagination for list endpoints
//! - [`serde`]: Query-string friendly deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use karnameh_core::errors::AppError;
//! use karnameh_core::pagination::{PaginationParams, PaginationMeta};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Student not found"));
//!
//! let params = PaginationParams::default();
//! let limit = params.limit();
//! ```

pub mod errors;
pub mod pagination;
pub mod serde;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
