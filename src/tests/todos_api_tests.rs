#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::models::{Product, Todo};
    use crate::store::{MemoryStore, SqlStore, StoreError, Storer};
    use crate::tests::{body_json, get, json_request, sqlite_pool, test_app};

    async fn sqlite_app() -> axum::Router {
        let todos: Arc<dyn Storer<Todo>> = Arc::new(SqlStore::new(sqlite_pool().await));
        let (app, _) = test_app(todos, Arc::new(MemoryStore::<Product>::new()));
        app
    }

    fn memory_app(todos: MemoryStore<Todo>) -> axum::Router {
        let (app, _) = test_app(Arc::new(todos), Arc::new(MemoryStore::<Product>::new()));
        app
    }

    #[tokio::test]
    async fn test_create_todo_returns_created() {
        let app = sqlite_app().await;

        let response = app
            .oneshot(json_request(Method::POST, "/todos", &json!({"title": "Buy groceries"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["data"]["title"], "Buy groceries");
        assert_eq!(body["data"]["completed"], false);
        assert!(body["data"]["id"].as_i64().unwrap() > 0);
        assert!(body["data"]["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_create_todo_requires_title() {
        let app = sqlite_app().await;

        let response = app.oneshot(json_request(Method::POST, "/todos", &json!({"title": "   "}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["fields"][0]["field"], "title");
        assert_eq!(body["error"]["details"]["fields"][0]["message"], "title is required");
    }

    #[tokio::test]
    async fn test_create_todo_rejects_malformed_json() {
        let app = sqlite_app().await;

        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/todos")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{\"title\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_list_todos_empty_is_ok() {
        let app = sqlite_app().await;

        let response = app.oneshot(get("/todos")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"data": []}));
    }

    #[tokio::test]
    async fn test_list_todos_filters_by_completed() {
        let app = sqlite_app().await;

        for title in ["one", "two"] {
            let response =
                app.clone().oneshot(json_request(Method::POST, "/todos", &json!({"title": title}))).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }
        let response = app
            .clone()
            .oneshot(json_request(Method::PATCH, "/todos/2", &json!({"completed": true})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let done = body_json(app.clone().oneshot(get("/todos?completed=true")).await.unwrap()).await;
        assert_eq!(done["data"].as_array().unwrap().len(), 1);
        assert_eq!(done["data"][0]["title"], "two");

        let all = body_json(app.oneshot(get("/todos")).await.unwrap()).await;
        assert_eq!(all["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_todos_rejects_bad_query() {
        let app = sqlite_app().await;
        let response = app.oneshot(get("/todos?completed=maybe")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_get_todo() {
        let app = sqlite_app().await;
        app.clone().oneshot(json_request(Method::POST, "/todos", &json!({"title": "Walk dog"}))).await.unwrap();

        let response = app.clone().oneshot(get("/todos/1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["title"], "Walk dog");

        let response = app.oneshot(get("/todos/2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["message"], "Todo not found");
    }

    #[tokio::test]
    async fn test_invalid_todo_id_never_reaches_storage() {
        let app = memory_app(MemoryStore::failing(|| StoreError::Backend("storage touched".into())));

        for uri in ["/todos/abc", "/todos/0", "/todos/-3"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body_json(response).await["error"]["message"], "Invalid ID format");
        }
    }

    #[tokio::test]
    async fn test_update_todo() {
        let app = sqlite_app().await;
        app.clone().oneshot(json_request(Method::POST, "/todos", &json!({"title": "Draft"}))).await.unwrap();

        let response = app
            .clone()
            .oneshot(json_request(Method::PATCH, "/todos/1", &json!({"title": "Final", "completed": true})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["id"], 1);
        assert_eq!(body["data"]["title"], "Final");
        assert_eq!(body["data"]["completed"], true);

        let stored = body_json(app.oneshot(get("/todos/1")).await.unwrap()).await;
        assert_eq!(stored["data"]["title"], "Final");
    }

    #[tokio::test]
    async fn test_update_missing_todo_is_not_found() {
        let app = sqlite_app().await;
        let response =
            app.oneshot(json_request(Method::PATCH, "/todos/9", &json!({"completed": true}))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_todo_validates_before_lookup() {
        let app = sqlite_app().await;
        let response =
            app.oneshot(json_request(Method::PATCH, "/todos/9", &json!({"title": "  "}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_invalid_update_never_reaches_storage() {
        let app = memory_app(MemoryStore::failing(|| StoreError::Backend("unreachable".into())));

        let response =
            app.oneshot(json_request(Method::PATCH, "/todos/1", &json!({"title": ""}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_storage_failure_is_internal_error_with_backend_message() {
        let app = memory_app(MemoryStore::failing(|| StoreError::Backend("disk I/O error".into())));

        let response = app.oneshot(get("/todos")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "STORAGE_ERROR");
        assert_eq!(body["error"]["message"], "disk I/O error");
    }
}
