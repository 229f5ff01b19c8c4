//! Offset/limit window of a find query

use std::fmt;

/// Row limit applied when the client does not send one
pub const DEFAULT_LIMIT: u64 = 1000;

/// Pagination parameters for limiting query results
///
/// # Example
///
/// ```rust
/// use book_service::repository::Pagination;
///
/// let page = Pagination::new(20, 10);
/// assert_eq!(page.to_string(), " LIMIT 10 OFFSET 20");
/// assert_eq!(Pagination::default().limit, 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    /// Create new pagination parameters
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// First `limit` rows
    #[must_use]
    pub const fn first_page(limit: u64) -> Self {
        Self { offset: 0, limit }
    }

    /// Cap the limit at `max`
    #[must_use]
    pub fn clamp(self, max: u64) -> Self {
        Self {
            offset: self.offset,
            limit: self.limit.min(max),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first_page(DEFAULT_LIMIT)
    }
}

/// Renders the SQL suffix ` LIMIT n OFFSET m`
impl fmt::Display for Pagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " LIMIT {} OFFSET {}", self.limit, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_default_limit() {
        assert_eq!(Pagination::default(), Pagination::new(0, DEFAULT_LIMIT));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(Pagination::new(5, 50_000).clamp(10_000), Pagination::new(5, 10_000));
        assert_eq!(Pagination::new(5, 2).clamp(10_000), Pagination::new(5, 2));
    }

    #[test]
    fn test_sql_suffix() {
        assert_eq!(Pagination::first_page(2).to_string(), " LIMIT 2 OFFSET 0");
    }
}
