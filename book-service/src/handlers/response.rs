//! Response envelopes for the book endpoints
//!
//! # Example
//!
//! ```rust
//! use book_service::handlers::{ItemResponse, ListResponse};
//!
//! let list = ListResponse::new(2, vec!["a", "b"]);
//! assert_eq!(serde_json::to_string(&list).unwrap(), r#"{"count":2,"data":["a","b"]}"#);
//!
//! let deleted = ItemResponse::new(true);
//! assert_eq!(serde_json::to_string(&deleted).unwrap(), r#"{"data":true}"#);
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Single item response wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse<T> {
    /// The response data
    pub data: T,
}

impl<T> ItemResponse<T> {
    /// Create a new item response
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ItemResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// List response wrapper
///
/// `count` is the number of rows matching the filter, regardless of the
/// offset/limit window that produced `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Rows matching the filter
    pub count: u64,
    /// Rows in the requested window
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    /// Create a new list response
    pub fn new(count: u64, data: Vec<T>) -> Self {
        Self { count, data }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
