//! Query-string parameters of the list endpoints

use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::config::QueryConfig;
use crate::query::FindQuery;
use crate::repository::Pagination;

/// Raw `query`, `offset` and `limit` parameters
///
/// Values are kept as strings so malformed numbers surface as API errors
/// with a readable message instead of a bare extractor rejection.
///
/// # Example
///
/// ```rust
/// use book_service::config::QueryConfig;
/// use book_service::handlers::ListParams;
///
/// let params = ListParams {
///     offset: Some("10".to_string()),
///     limit: Some("2".to_string()),
///     ..ListParams::default()
/// };
/// let page = params.pagination(&QueryConfig::default()).unwrap();
/// assert_eq!((page.offset, page.limit), (10, 2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// JSON-encoded [`FindQuery`], GET only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Rows to skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,

    /// Maximum rows to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

impl ListParams {
    /// Offset/limit window, with the configured default and cap applied
    pub fn pagination(&self, config: &QueryConfig) -> Result<Pagination, ApiError> {
        let offset = parse_count("offset", self.offset.as_deref())?.unwrap_or(0);
        let limit = parse_count("limit", self.limit.as_deref())?.unwrap_or(config.default_limit);
        Ok(Pagination::new(offset, limit).clamp(config.max_limit))
    }

    /// Decode the `query` parameter; absent or blank means match everything
    pub fn find_query(&self) -> Result<FindQuery, ApiError> {
        match self.query.as_deref().map(str::trim) {
            None | Some("") => Ok(FindQuery::default()),
            Some(json) => Ok(FindQuery::from_json(json)?),
        }
    }
}

/// Largest offset or limit the database accepts (a signed 64-bit integer)
const MAX_COUNT: u64 = i64::MAX as u64;

fn parse_count(name: &str, raw: Option<&str>) -> Result<Option<u64>, ApiError> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };
    match value.parse::<u64>() {
        Ok(count) if count <= MAX_COUNT => Ok(Some(count)),
        Ok(_) => Err(ApiError::bad_request(format!(
            "invalid {name} '{value}': must not exceed {MAX_COUNT}"
        ))),
        Err(_) => Err(ApiError::bad_request(format!(
            "invalid {name} '{value}': expected a non-negative integer"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::handlers::ApiErrorKind;

    fn params(offset: Option<&str>, limit: Option<&str>) -> ListParams {
        ListParams {
            query: None,
            offset: offset.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults() {
        let page = ListParams::default()
            .pagination(&QueryConfig::default())
            .unwrap();
        assert_eq!(page, Pagination::new(0, 1000));
    }

    #[test]
    fn test_limit_is_capped() {
        let config = QueryConfig {
            default_limit: 50,
            max_limit: 100,
        };
        assert_eq!(
            params(Some("5"), Some("5000")).pagination(&config).unwrap(),
            Pagination::new(5, 100)
        );
        assert_eq!(
            params(None, None).pagination(&config).unwrap(),
            Pagination::new(0, 50)
        );
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        for (offset, limit) in [(Some("-1"), None), (None, Some("ten")), (Some("1.5"), None)] {
            let err = params(offset, limit)
                .pagination(&QueryConfig::default())
                .unwrap_err();
            assert_eq!(err.kind, ApiErrorKind::BadRequest);
        }
    }

    #[test]
    fn test_counts_beyond_signed_range_are_rejected() {
        let max = i64::MAX.to_string();
        assert_eq!(
            params(Some(&max), None).pagination(&QueryConfig::default()).unwrap(),
            Pagination::new(i64::MAX as u64, 1000)
        );

        let too_big = (i64::MAX as u64 + 1).to_string();
        for (offset, limit) in [
            (Some(too_big.as_str()), None),
            (None, Some(too_big.as_str())),
            (Some("18446744073709551615"), None),
        ] {
            let err = params(offset, limit)
                .pagination(&QueryConfig::default())
                .unwrap_err();
            assert_eq!(err.kind, ApiErrorKind::BadRequest);
            assert!(err.message.contains("must not exceed"), "{}", err.message);
        }
    }

    #[test]
    fn test_find_query_parameter() {
        let blank = ListParams {
            query: Some("  ".to_string()),
            ..ListParams::default()
        };
        assert_eq!(blank.find_query().unwrap(), FindQuery::default());

        let like = ListParams {
            query: Some(r#"{"where":{"e":[{"f":"title","o":"LIKE","v":"%Tintin%"}]}}"#.to_string()),
            ..ListParams::default()
        };
        assert_eq!(
            like.find_query().unwrap(),
            FindQuery::filter(Condition::new().like("title", "Tintin"))
        );

        let broken = ListParams {
            query: Some(r#"{"where":{"e":[{"f":"title","o":"between","v":1}]}}"#.to_string()),
            ..ListParams::default()
        };
        assert_eq!(broken.find_query().unwrap_err().kind, ApiErrorKind::BadRequest);
    }
}
