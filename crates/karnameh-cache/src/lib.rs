//! # Karnameh Cache
//!
//! Caching for computed reports.
//!
//! Reports are always derived from lesson records; this crate only memoizes
//! them. It provides:
//! - A Redis client storing JSON values with a TTL
//! - Cache configuration from environment variables
//! - Report key builders and invalidation helpers
//! - HTTP caching middleware (ETag, Cache-Control)
//!
//! # Example
//!
//! ```ignore
//! use karnameh_cache::{CacheConfig, RedisCache, keys};
//!
//! let config = CacheConfig::from_env();
//! let cache = RedisCache::connect(&config).await?;
//!
//! let key = keys::course_record(cache.prefix(), student_id, course_id, school_year);
//! cache.set(&key, &record).await?;
//! let cached: Option<CourseYearRecord> = cache.get(&key).await;
//! ```

pub mod config;
pub mod keys;
pub mod middleware;
pub mod redis;

pub use config::CacheConfig;
pub use keys::invalidate;
pub use middleware::{CacheControl, cache_control, etag_middleware};
pub use redis::{CacheError, RedisCache};
