//! Route handlers.
//!
//! Store calls are blocking `SQLite` work, so every one runs on the blocking
//! pool. User mistakes come back as page messages; anything else is logged
//! and answered with the generic failure page.

use super::page::{parse_view, Flash, PageContext, PageRequest, TaskForm};
use super::AppState;
use crate::error::{Error, Result};
use crate::tasks::{local_now, Task, TaskStore, ViewFilter};
use crate::templates::{self, ERROR_TEMPLATE, PAGE_TEMPLATE};
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info, warn};

/// Message shown when the request failed for reasons outside the user's control.
const FAILURE_MESSAGE: &str = "The task list is unavailable right now. Please try again later.";

#[derive(Debug, Default, Deserialize)]
pub(super) struct PageQuery {
    view: Option<String>,
    flash: Option<String>,
}

/// Query of routes that only take a view: `/api/tasks` and the complete action.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ViewQuery {
    view: Option<String>,
}

/// Run a store call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| Error::Io(std::io::Error::other(e)))?
}

fn failure(err: &Error) -> Response {
    error!(error = %err, "request failed");
    let mut ctx = tera::Context::new();
    ctx.insert("message", FAILURE_MESSAGE);
    match templates::render(ERROR_TEMPLATE, &ctx) {
        Ok(body) => (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response(),
        Err(e) => {
            error!(error = %e, "failure page could not be rendered");
            (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_MESSAGE).into_response()
        }
    }
}

async fn render_page(state: &AppState, request: PageRequest, status: StatusCode) -> Response {
    let store = state.store.clone();
    let view = request.view;
    let now = local_now();
    let loaded = blocking(move || Ok((store.list_tasks(view, now)?, store.counts()?))).await;

    let (tasks, counts) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => return failure(&e),
    };

    let page = PageContext::build(request, tasks, counts, state.alerts.recent(), now);
    let rendered = tera::Context::from_serialize(&page)
        .map_err(|e| Error::Template(e.to_string()))
        .and_then(|ctx| templates::render(PAGE_TEMPLATE, &ctx));
    match rendered {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => failure(&e),
    }
}

/// `GET /`
pub(super) async fn index(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let view = parse_view(query.view.as_deref());
    let flash = query.flash.as_deref().and_then(Flash::from_query);
    render_page(&state, PageRequest::new(view, flash), StatusCode::OK).await
}

/// `POST /tasks`
pub(super) async fn create_task(State(state): State<AppState>, Form(form): Form<TaskForm>) -> Response {
    let new_task = match form.to_new_task() {
        Ok(t) => t,
        Err(e) => {
            info!(error = %e, "task rejected");
            let request = PageRequest::rejected(form, e.to_string());
            return render_page(&state, request, StatusCode::UNPROCESSABLE_ENTITY).await;
        }
    };

    let view = parse_view(Some(form.view.as_str()));
    let store = state.store.clone();
    let now = local_now();
    match blocking(move || store.create_task(&new_task, now)).await {
        Ok(task) => {
            info!(task_id = task.id, title = %task.title, "task created");
            Redirect::to(&Flash::Created.redirect_target(view)).into_response()
        }
        Err(Error::Validation(e)) => {
            info!(error = %e, "task rejected");
            let request = PageRequest::rejected(form, e.to_string());
            render_page(&state, request, StatusCode::UNPROCESSABLE_ENTITY).await
        }
        Err(e) => failure(&e),
    }
}

/// `POST /tasks/{id}/complete`
pub(super) async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ViewQuery>,
) -> Response {
    let view = parse_view(query.view.as_deref());
    let store = state.store.clone();
    match blocking(move || store.complete_task(id)).await {
        Ok(_) => {
            info!(task_id = id, "task marked complete");
            Redirect::to(&Flash::Completed.redirect_target(view)).into_response()
        }
        Err(Error::TaskNotFound(_)) => {
            warn!(task_id = id, "complete requested for missing task");
            Redirect::to(&Flash::NotFound.redirect_target(view)).into_response()
        }
        Err(e) => failure(&e),
    }
}

/// `GET /api/tasks`
pub(super) async fn api_tasks(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> std::result::Result<Json<Vec<Task>>, (StatusCode, Json<serde_json::Value>)> {
    let view: ViewFilter = parse_view(query.view.as_deref());
    let store = state.store.clone();
    blocking(move || store.list_tasks(view, local_now())).await.map(Json).map_err(|e| {
        error!(error = %e, "task listing failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": FAILURE_MESSAGE })))
    })
}

/// `GET /health`
pub(super) async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
