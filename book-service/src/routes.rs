//! Router assembly

use axum::{routing::get, Router};

use crate::handlers::{create_book, delete_book, find_books, get_book, list_books, update_book};
use crate::health::{health, readiness};
use crate::state::AppState;

/// Build the application router
///
/// | Method | Path          | Handler |
/// |--------|---------------|---------|
/// | GET    | `/books`      | search via `?query=` |
/// | POST   | `/books`      | search via JSON body |
/// | PUT    | `/books`      | create |
/// | GET    | `/books/{id}` | fetch |
/// | PATCH  | `/books/{id}` | update |
/// | DELETE | `/books/{id}` | delete |
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .route("/books", get(list_books).post(find_books).put(create_book))
        .route(
            "/books/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::condition::Condition;
    use crate::query::{fields, FindQuery, OrderBy};

    const PHILOSOPHER: &str = "Harry Potter and the Philosopher's Stone";
    const CHAMBER: &str = "Harry Potter and the Chamber of Secrets";
    const DARK_MAGIC: &str = "Harry Potter and Book of Dark Magic";

    async fn app() -> Router {
        router(AppState::in_memory().await)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, title: &str, author: &str, summary: &str) -> Value {
        let (status, body) = send(
            app,
            Method::PUT,
            "/books",
            Some(json!({"title": title, "author": author, "summary": summary})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"].clone()
    }

    async fn search(app: &Router, query: &FindQuery) -> (StatusCode, Value) {
        send(
            app,
            Method::POST,
            "/books",
            Some(serde_json::to_value(query).unwrap()),
        )
        .await
    }

    fn ids(body: &Value) -> Vec<i64> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|book| book["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_book_crud_scenario() {
        let app = app().await;

        let (status, body) = send(&app, Method::GET, "/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"count": 0, "data": []}));

        let book = create(&app, PHILOSOPHER, "J. K. Rawling", "The boy who lived").await;
        assert_eq!(
            book,
            json!({"id": 1, "title": PHILOSOPHER, "author": "J. K. Rawling", "summary": "The boy who lived"})
        );
        assert_eq!(create(&app, CHAMBER, "J. K. Rawling", "").await["id"], 2);
        assert_eq!(create(&app, DARK_MAGIC, "Lord Voldermort", "").await["id"], 3);

        let chamber = FindQuery::filter(Condition::new().like("title", "Chamber of Secrets"));
        let (_, body) = search(&app, &chamber).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["title"], CHAMBER);

        let good = FindQuery::filter(
            Condition::new().not(Condition::new().equal("author", "Lord Voldermort")),
        );
        let (_, body) = search(&app, &good).await;
        assert_eq!(ids(&body), vec![1, 2]);

        assert_eq!(create(&app, "Tintin in Tibet", "Herge", "").await["id"], 4);

        let potter = Condition::new().like("title", "Harry Potter");
        let (_, body) = search(&app, &FindQuery::filter(potter.clone())).await;
        assert_eq!(body["count"], 3);
        let rawling = FindQuery::filter(potter.equal("author", "J. K. Rawling"));
        let (_, body) = search(&app, &rawling).await;
        assert_eq!(body["count"], 2);

        let (status, body) = send(&app, Method::DELETE, "/books/3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"data": true}));

        assert_eq!(create(&app, "Tintin in Jakarta", "Herge", "").await["id"], 5);
        let (status, body) = send(
            &app,
            Method::PATCH,
            "/books/5",
            Some(json!({"title": "Tintin in America"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!({"id": 5, "title": "Tintin in America", "author": "Herge"})
        );

        let (status, body) = send(&app, Method::GET, "/books?limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 4);
        assert_eq!(ids(&body), vec![1, 2]);

        let (status, body) = send(
            &app,
            Method::PUT,
            "/books",
            Some(json!({"title": "Tintin in America", "author": "Herge"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Duplicate value books.title");

        for method in [Method::PATCH, Method::DELETE, Method::GET] {
            let payload = (method == Method::PATCH).then(|| json!({"title": "Nothing"}));
            let (status, body) = send(&app, method, "/books/9999", payload).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(
                body,
                json!({"error": "record not found", "code": "NOT_FOUND", "status": 404})
            );
        }

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/books/5",
            Some(json!({"title": PHILOSOPHER})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Duplicate value books.title");

        let projected = FindQuery::new(
            Some(fields(["id", "title"])),
            Condition::new(),
            Some(OrderBy::desc("id")),
        );
        let (_, body) = search(&app, &projected).await;
        assert_eq!(
            body,
            json!({"count": 4, "data": [
                {"id": 5, "title": "Tintin in America"},
                {"id": 4, "title": "Tintin in Tibet"},
                {"id": 2, "title": CHAMBER},
                {"id": 1, "title": PHILOSOPHER},
            ]})
        );
    }

    #[tokio::test]
    async fn test_get_with_encoded_query() {
        let app = app().await;
        create(&app, "Tintin in Tibet", "Herge", "").await;
        create(&app, "Tintin in America", "Herge", "").await;
        create(&app, CHAMBER, "J. K. Rawling", "").await;

        let query = FindQuery::new(
            None,
            Condition::new().ilike("title", "tintin"),
            Some(OrderBy::desc("id")),
        );
        let params = serde_urlencoded::to_string([
            ("offset", "1".to_string()),
            ("query", query.to_query_string()),
        ])
        .unwrap();
        let uri = format!("/books?{params}");
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"], json!([{"id": 1, "title": "Tintin in Tibet", "author": "Herge"}]));
    }

    #[tokio::test]
    async fn test_rejected_queries() {
        let app = app().await;

        let bad_operator = json!({"where": {"e": [{"f": "title", "o": "BETWEEN", "v": 1}]}});
        let (status, body) = send(&app, Method::POST, "/books", Some(bad_operator)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["error"].as_str().unwrap().contains("BETWEEN"));

        let bad_value = json!({"where": {"e": [{"f": "title", "o": "LIKE", "v": 1000}]}});
        let (status, _) = send(&app, Method::POST, "/books", Some(bad_value)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let unknown_column = json!({"select": ["secret"]});
        let (status, body) = send(&app, Method::POST, "/books", Some(unknown_column)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "unknown column: secret");

        let (status, _) = send(&app, Method::GET, "/books?limit=-1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            send(&app, Method::GET, "/books?offset=18446744073709551615", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, _) = send(&app, Method::GET, "/books?query=%7Bnot%20json", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::GET, "/books/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid book id 'abc'");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let app = app().await;

        let (status, body) = send(&app, Method::PUT, "/books", Some(json!({"title": "Untitled"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "missing required field(s): author");

        let (status, body) = send(&app, Method::PUT, "/books", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_post_with_empty_body_lists_everything() {
        let app = app().await;
        create(&app, "Tintin in Tibet", "Herge", "").await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/books")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "book-service");
    }
}
