//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Default page size for paginated listings.
pub const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for paginated listings.
pub const MAX_LIMIT: i64 = 100;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Limit clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Offset, never negative.
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Optional `?status=` filter used by offboarding and connection listings.
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let params = PaginationParams { limit: None, offset: None };
        assert_eq!(params.limit(), DEFAULT_LIMIT);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams { limit: Some(500), offset: Some(-3) };
        assert_eq!(params.limit(), MAX_LIMIT);
        assert_eq!(params.offset(), 0);

        let params = PaginationParams { limit: Some(0), offset: Some(20) };
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 20);
    }
}
