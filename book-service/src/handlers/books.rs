//! Book endpoints

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use super::{ApiError, ApiOperation, ItemResponse, ListParams, ListResponse};
use crate::condition::ConditionError;
use crate::query::FindQuery;
use crate::repository::{
    Book, BookChanges, NewBook, Pagination, Repository, RepositoryError, RepositoryOperation,
};
use crate::state::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// `GET /books`: search with the JSON query carried in `?query=`
pub async fn list_books(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<ListResponse<Book>> {
    let Query(params) = params?;
    let pagination = params.pagination(&state.config().query)?;
    let query = params.find_query()?;
    find(&state, &query, pagination).await
}

/// `POST /books`: search with the JSON query as the request body
///
/// An empty body matches every book.
pub async fn find_books(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<ListResponse<Book>> {
    let Query(params) = params?;
    let pagination = params.pagination(&state.config().query)?;
    let query = if body.iter().all(u8::is_ascii_whitespace) {
        FindQuery::default()
    } else {
        let value: serde_json::Value = serde_json::from_slice(&body).map_err(ConditionError::from)?;
        FindQuery::from_value(value)?
    };
    find(&state, &query, pagination).await
}

/// Count against the filter alone, then fetch the requested window
async fn find(
    state: &AppState,
    query: &FindQuery,
    pagination: Pagination,
) -> ApiResult<ListResponse<Book>> {
    tracing::debug!(
        query = %query,
        offset = pagination.offset,
        limit = pagination.limit,
        "Finding books"
    );
    let books = state.books();
    let count = books.count(&query.condition).await?;
    let data = books.find_all(query, pagination).await?;
    Ok(ListResponse::new(count, data))
}

/// `GET /books/{id}`
pub async fn get_book(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<ItemResponse<Book>> {
    let id = book_id(id)?;
    state
        .books()
        .find_by_id(&id)
        .await?
        .map(ItemResponse::new)
        .ok_or_else(|| RepositoryError::not_found("Book", id.to_string()).into())
}

/// `PUT /books`: create a book
pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> ApiResult<ItemResponse<Book>> {
    let Json(input) = payload.map_err(|e| ApiError::from(e).with_operation(ApiOperation::Create))?;
    let book = state.books().create(input).await?;
    Ok(ItemResponse::new(book))
}

/// `PATCH /books/{id}`: change the non-empty fields of a book
pub async fn update_book(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<BookChanges>, JsonRejection>,
) -> ApiResult<ItemResponse<Book>> {
    let id = book_id(id)?;
    let Json(changes) = payload.map_err(|e| ApiError::from(e).with_operation(ApiOperation::Update))?;
    let book = state.books().update(&id, changes).await?;
    Ok(ItemResponse::new(book))
}

/// `DELETE /books/{id}`
pub async fn delete_book(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> ApiResult<ItemResponse<bool>> {
    let id = book_id(id)?;
    if state.books().delete(&id).await? {
        Ok(ItemResponse::new(true))
    } else {
        Err(RepositoryError::not_found("Book", id.to_string())
            .with_operation(RepositoryOperation::Delete)
            .into())
    }
}

fn book_id(raw: Result<Path<String>, PathRejection>) -> ApiResult<i64> {
    let Path(raw) = raw?;
    raw.trim().parse().map_err(|_| {
        ApiError::bad_request(format!("invalid book id '{raw}'")).with_operation(ApiOperation::Get)
    })
}
