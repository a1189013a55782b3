//! Query parameter types for API handlers.

use serde::Deserialize;

/// Page size used when `limit` is absent.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Largest page a client may ask for.
pub const MAX_HISTORY_LIMIT: i64 = 200;

/// Pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// `limit` clamped to `1..=max`, or `default` when absent.
    pub fn limit_or(&self, default: i64, max: i64) -> usize {
        self.limit.unwrap_or(default).clamp(1, max) as usize
    }

    /// Non-negative `offset`.
    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0).max(0) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let params = |limit| PaginationParams {
            limit,
            offset: None,
        };
        assert_eq!(params(None).limit_or(50, 200), 50);
        assert_eq!(params(Some(0)).limit_or(50, 200), 1);
        assert_eq!(params(Some(-7)).limit_or(50, 200), 1);
        assert_eq!(params(Some(10_000)).limit_or(50, 200), 200);
    }

    #[test]
    fn negative_offset_becomes_zero() {
        let params = PaginationParams {
            limit: None,
            offset: Some(-3),
        };
        assert_eq!(params.offset(), 0);
    }
}
