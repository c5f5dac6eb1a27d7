use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult, NotFoundExt},
    extract::{ApiJson, ApiQuery},
    models::Todo,
    routes::Tracked,
    state::AppState,
    store::Filter,
    types::{CreateTodoRequest, DataResponse, ListResponse, ListTodosQuery, UpdateTodoRequest},
};

fn parse_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest("Invalid ID format".into())),
    }
}

pub async fn list_todos(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListTodosQuery>,
) -> AppResult<Json<ListResponse<Todo>>> {
    let mut filter = Filter::new();
    if let Some(completed) = query.completed {
        filter = filter.eq("completed", completed);
    }

    let todos = state.todos.find(&filter).await.tracked(&state.metrics)?;
    state.metrics.inc_lists();
    Ok(Json(ListResponse { data: todos, total: None }))
}

pub async fn create_todo(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateTodoRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Todo>>)> {
    let mut todo = req.into_todo()?;
    state.todos.create(&mut todo).await.tracked(&state.metrics)?;
    state.metrics.inc_created();
    tracing::info!(id = ?todo.id, "todo created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(todo))))
}

pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<Todo>>> {
    let id = parse_id(&id)?;
    let todo = state.todos.first(&Filter::by_id(id)).await.tracked(&state.metrics).or_not_found("Todo")?;
    state.metrics.inc_lookups();
    Ok(Json(DataResponse::new(todo)))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateTodoRequest>,
) -> AppResult<Json<DataResponse<Todo>>> {
    let id = parse_id(&id)?;
    let changes = req.validated()?;
    let mut todo = state.todos.first(&Filter::by_id(id)).await.tracked(&state.metrics).or_not_found("Todo")?;
    changes.apply(&mut todo);
    state.todos.save(&mut todo).await.tracked(&state.metrics)?;
    state.metrics.inc_saved();
    tracing::info!(id, "todo updated");
    Ok(Json(DataResponse::new(todo)))
}
