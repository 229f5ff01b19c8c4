//! HTTP handlers for the book collection
//!
//! Handlers translate requests into repository calls and every failure into
//! an [`ApiError`]. Successful responses use the [`ItemResponse`] and
//! [`ListResponse`] envelopes.

mod books;
mod error;
mod query;
mod response;

pub use books::{create_book, delete_book, find_books, get_book, list_books, update_book};
pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use query::ListParams;
pub use response::{ItemResponse, ListResponse};
