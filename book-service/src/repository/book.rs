//! Book storage over the sqlx `Any` driver

use serde::{Deserialize, Serialize};
use sqlx::any::AnyArguments;
use sqlx::error::DatabaseError;
use sqlx::{Any, AnyPool, Arguments};

use super::error::{RepositoryError, RepositoryOperation};
use super::pagination::Pagination;
use super::traits::{Repository, RepositoryResult};
use crate::condition::{Condition, Value};
use crate::database::Dialect;
use crate::query::FindQuery;

/// Columns a query may refer to
pub const BOOK_COLUMNS: &[&str] = &["id", "title", "author", "summary"];

const ALL_COLUMNS: &str = "id, title, author, summary";
const ENTITY: &str = "Book";

/// A stored book
///
/// Empty fields are left out of the JSON form, so a projected row only shows
/// the selected columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[sqlx(default)]
pub struct Book {
    /// Generated identifier
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: i64,
    /// Title, unique across books
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Author name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    /// Free-form summary
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
}

fn is_zero(id: &i64) -> bool {
    *id == 0
}

/// Input for creating a book
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    /// Required
    #[serde(default)]
    pub title: String,
    /// Required
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
}

impl NewBook {
    /// Book without a summary
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            summary: String::new(),
        }
    }

    /// Set the summary
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    fn validate(&self) -> RepositoryResult<()> {
        let missing: Vec<&str> = [("title", &self.title), ("author", &self.author)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::validation_failed(
                RepositoryOperation::Create,
                format!("missing required field(s): {}", missing.join(", ")),
            ))
        }
    }
}

/// Partial update of a book
///
/// Absent and empty fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl BookChanges {
    fn apply(self, book: &mut Book) {
        let fields = [
            (self.title, &mut book.title),
            (self.author, &mut book.author),
            (self.summary, &mut book.summary),
        ];
        for (change, target) in fields {
            if let Some(value) = change.filter(|v| !v.is_empty()) {
                *target = value;
            }
        }
    }
}

/// Book repository bound to a pool and its SQL dialect
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: AnyPool,
    dialect: Dialect,
}

impl BookRepository {
    /// Create a repository over `pool`
    pub fn new(pool: AnyPool, dialect: Dialect) -> Self {
        Self { pool, dialect }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// SQL dialect of the pool
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Create the `books` table and its unique title index when missing
    pub async fn ensure_schema(&self) -> RepositoryResult<()> {
        let id_column = match self.dialect {
            Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
            Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        };
        let statements = [
            format!(
                "CREATE TABLE IF NOT EXISTS books ({id_column}, \
                 title TEXT NOT NULL, \
                 author TEXT NOT NULL, \
                 summary TEXT NOT NULL DEFAULT '')"
            ),
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_books_title ON books (title)".to_string(),
        ];

        for statement in &statements {
            sqlx::query::<Any>(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| self.map_error(RepositoryOperation::Migrate, e))?;
        }

        tracing::info!(dialect = self.dialect.name(), "Books schema ready");
        Ok(())
    }

    /// Round-trip a trivial statement
    pub async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query::<Any>("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| self.map_error(RepositoryOperation::FindAll, e))
    }

    fn check_columns<'a>(
        operation: RepositoryOperation,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> RepositoryResult<()> {
        for column in columns {
            if !BOOK_COLUMNS.contains(&column) {
                return Err(RepositoryError::invalid_query(
                    operation,
                    format!("unknown column: {column}"),
                ));
            }
        }
        Ok(())
    }

    fn map_error(&self, operation: RepositoryOperation, err: sqlx::Error) -> RepositoryError {
        match err {
            sqlx::Error::Database(db) => {
                if let Some(column) = self.duplicate_column(db.as_ref()) {
                    return RepositoryError::duplicate(operation, &column);
                }
                tracing::error!(%operation, code = ?db.code(), "Database error: {}", db.message());
                RepositoryError::database_error(operation, db.message())
            }
            sqlx::Error::PoolTimedOut => {
                RepositoryError::timeout(operation, "timed out acquiring a connection")
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                tracing::error!(%operation, "Database connection error: {}", err);
                RepositoryError::connection_failed(operation, err.to_string())
            }
            other => {
                tracing::error!(%operation, "Database error: {}", other);
                RepositoryError::database_error(operation, other.to_string())
            }
        }
    }

    /// Column (or constraint) named by a unique violation
    fn duplicate_column(&self, db: &dyn DatabaseError) -> Option<String> {
        match self.dialect {
            Dialect::Sqlite => db
                .message()
                .strip_prefix("UNIQUE constraint failed: ")
                .map(str::to_string),
            Dialect::Postgres if db.is_unique_violation() => Some(match db.constraint() {
                Some("idx_books_title") => "books.title".to_string(),
                Some(other) => other.to_string(),
                None => "books".to_string(),
            }),
            Dialect::Postgres => None,
        }
    }
}

/// Bind arguments for compiled condition values
fn arguments(params: &[Value]) -> RepositoryResult<AnyArguments<'_>> {
    let mut args = AnyArguments::default();
    for param in params {
        let added = match param {
            Value::Text(s) => args.add(s.clone()),
            Value::Integer(n) => args.add(*n),
            Value::Float(n) => args.add(*n),
        };
        added.map_err(|e| {
            RepositoryError::invalid_query(
                RepositoryOperation::FindAll,
                format!("cannot bind {param}: {e}"),
            )
        })?;
    }
    Ok(args)
}

impl Repository<i64, Book, NewBook, BookChanges> for BookRepository {
    async fn find_by_id(&self, id: &i64) -> RepositoryResult<Option<Book>> {
        let sql = format!(
            "SELECT {ALL_COLUMNS} FROM books WHERE id = {}",
            self.dialect.placeholder(1)
        );
        sqlx::query_as::<Any, Book>(&sql)
            .bind(*id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.map_error(RepositoryOperation::FindById, e))
    }

    async fn find_all(&self, query: &FindQuery, pagination: Pagination) -> RepositoryResult<Vec<Book>> {
        Self::check_columns(RepositoryOperation::FindAll, query.columns())?;

        let columns = match query.select.as_deref() {
            Some(select) if !select.is_empty() => select.join(", "),
            _ => ALL_COLUMNS.to_string(),
        };
        let (order_column, direction) = match &query.order_by {
            Some(order) if !order.field.is_empty() => {
                (order.field.as_str(), if order.desc { "DESC" } else { "ASC" })
            }
            _ => ("id", "ASC"),
        };

        let compiled = query
            .condition
            .compile_with(self.dialect.compile_options());
        let sql = format!(
            "SELECT {columns} FROM books{} ORDER BY {order_column} {direction}{pagination}",
            compiled.where_clause()
        );
        tracing::debug!(%sql, params = compiled.params.len(), "Finding books");

        let args = arguments(&compiled.params)?;
        sqlx::query_as_with::<Any, Book, _>(&sql, args)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| self.map_error(RepositoryOperation::FindAll, e))
    }

    async fn count(&self, condition: &Condition) -> RepositoryResult<u64> {
        Self::check_columns(RepositoryOperation::Count, condition.fields())?;

        let compiled = condition.compile_with(self.dialect.compile_options());
        let sql = format!("SELECT COUNT(*) FROM books{}", compiled.where_clause());
        tracing::debug!(%sql, params = compiled.params.len(), "Counting books");

        let args = arguments(&compiled.params)
            .map_err(|e| e.with_operation(RepositoryOperation::Count))?;
        let count: i64 = sqlx::query_scalar_with::<Any, i64, _>(&sql, args)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.map_error(RepositoryOperation::Count, e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn create(&self, data: NewBook) -> RepositoryResult<Book> {
        data.validate()?;

        let d = self.dialect;
        let sql = format!(
            "INSERT INTO books (title, author, summary) VALUES ({}, {}, {}) RETURNING {ALL_COLUMNS}",
            d.placeholder(1),
            d.placeholder(2),
            d.placeholder(3)
        );
        let book = sqlx::query_as::<Any, Book>(&sql)
            .bind(data.title)
            .bind(data.author)
            .bind(data.summary)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| self.map_error(RepositoryOperation::Create, e))?;

        tracing::info!(id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    async fn update(&self, id: &i64, data: BookChanges) -> RepositoryResult<Book> {
        let Some(mut book) = self.find_by_id(id).await? else {
            return Err(RepositoryError::not_found(ENTITY, id.to_string())
                .with_operation(RepositoryOperation::Update));
        };
        data.apply(&mut book);

        let d = self.dialect;
        let sql = format!(
            "UPDATE books SET title = {}, author = {}, summary = {} WHERE id = {}",
            d.placeholder(1),
            d.placeholder(2),
            d.placeholder(3),
            d.placeholder(4)
        );
        sqlx::query::<Any>(&sql)
            .bind(book.title.clone())
            .bind(book.author.clone())
            .bind(book.summary.clone())
            .bind(book.id)
            .execute(&self.pool)
            .await
            .map_err(|e| self.map_error(RepositoryOperation::Update, e))?;

        tracing::info!(id = book.id, "Book updated");
        Ok(book)
    }

    async fn delete(&self, id: &i64) -> RepositoryResult<bool> {
        let sql = format!("DELETE FROM books WHERE id = {}", self.dialect.placeholder(1));
        let result = sqlx::query::<Any>(&sql)
            .bind(*id)
            .execute(&self.pool)
            .await
            .map_err(|e| self.map_error(RepositoryOperation::Delete, e))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(id, "Book deleted");
        }
        Ok(deleted)
    }
}

/// Single-connection in-memory SQLite repository with the schema in place
#[cfg(test)]
pub(crate) async fn memory_repository() -> BookRepository {
    sqlx::any::install_default_drivers();
    let pool = sqlx::any::AnyPoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    let repo = BookRepository::new(pool, Dialect::Sqlite);
    repo.ensure_schema().await.expect("schema");
    repo
}
