//! Book persistence
//!
//! [`Repository`] is the CRUD seam the HTTP handlers program against, and
//! [`BookRepository`] implements it over a sqlx `Any` pool. Find queries are
//! compiled from a [`FindQuery`](crate::query::FindQuery) into parameterized
//! SQL; every column a query names is checked against [`BOOK_COLUMNS`] first.

mod book;
mod error;
mod pagination;
mod traits;

pub use book::{Book, BookChanges, BookRepository, NewBook, BOOK_COLUMNS};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use pagination::{Pagination, DEFAULT_LIMIT};
pub use traits::{Repository, RepositoryResult};

#[cfg(test)]
pub(crate) use book::memory_repository;
