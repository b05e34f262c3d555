//! Pagination for list endpoints.
//!
//! List endpoints accept `limit` and `page` (1-indexed) query parameters and
//! answer with a `{ data, meta }` body. Query strings carry every value as a
//! string, so empty values (`?page=`) are treated as absent.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::serde::empty_string_as_none;

/// Default number of items per page.
pub const DEFAULT_LIMIT: i64 = 20;

/// Upper bound for `limit`.
pub const MAX_LIMIT: i64 = 200;

/// Metadata about a paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of items across all pages
    pub total: i64,
    /// Items per page that was applied
    pub limit: i64,
    /// Current page number (1-indexed)
    pub page: i64,
    /// Whether there are more items after this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total: i64) -> Self {
        let limit = params.limit();
        Self {
            total,
            limit,
            page: params.page(),
            has_more: params.offset() + limit < total,
        }
    }
}

/// Query parameters for pagination.
#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, IntoParams)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-200, default: 20)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<i64>,
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<i64>,
}

impl PaginationParams {
    /// Effective limit, clamped to `[1, MAX_LIMIT]`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Effective page, never below 1.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}
