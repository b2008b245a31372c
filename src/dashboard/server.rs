//! HTTP server implementation for the web UI.
//!
//! This module provides the axum-based HTTP server that serves the task
//! manager page, the htmx fragments it drives, and a JSON API mirroring
//! the gateway contract.

use axum::{
    Router,
    extract::{Form, Path, Query, State},
    response::{Html, Json},
    routing::{delete, get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::templates;
use crate::db::today_local;
use crate::error::StoreError;
use crate::gateway::{SqliteGateway, StoreGateway};
use crate::subscriptions::ChangeFeed;
use crate::types::{List, Task, TaskPatch};
use crate::views::View;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppServer {
    /// Gateway the handlers read and write through.
    gateway: SqliteGateway,
    /// Change feed backing `/api/revision`.
    feed: Arc<ChangeFeed>,
}

impl AppServer {
    pub fn new(gateway: SqliteGateway, feed: Arc<ChangeFeed>) -> Self {
        Self { gateway, feed }
    }
}

/// Write-result envelope: exactly one of `error` / `data` is set.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub error: Option<StoreError>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn from_result(result: Result<T, StoreError>) -> Self {
        match result {
            Ok(data) => Self {
                error: None,
                data: Some(data),
            },
            Err(error) => Self {
                error: Some(error),
                data: None,
            },
        }
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct ViewQuery {
    view: Option<String>,
}

impl ViewQuery {
    fn parse(&self) -> Option<View> {
        // An empty token means "no filter", not a list named "".
        self.view
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(View::parse)
    }
}

/// Root endpoint - serves the single-page UI shell.
async fn root() -> Html<&'static str> {
    Html(templates::INDEX_TEMPLATE)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Current change-feed revision; clients re-fetch when it moves.
async fn api_revision(State(state): State<AppServer>) -> Json<u64> {
    Json(state.feed.revision())
}

// =============================================================================
// htmx fragments
// =============================================================================

/// Escape text for embedding in an HTML fragment.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn view_title(view: &Option<View>, lists: &[List]) -> String {
    match view {
        Some(View::Today) => "Today".to_string(),
        Some(View::Week) => "Next 7 Days".to_string(),
        Some(View::Inbox) => "Inbox".to_string(),
        None => "All Tasks".to_string(),
        Some(View::ByList(id)) => lists
            .iter()
            .find(|l| l.id == *id)
            .map(|l| html_escape(&l.name))
            .unwrap_or_else(|| "List".to_string()),
    }
}

fn render_task_row(task: &Task, view_token: &str) -> String {
    let today = today_local();
    let done_class = if task.completed { " done" } else { "" };
    let checked = if task.completed { " checked" } else { "" };

    let date_badge = match task.due_date {
        Some(due) => {
            let overdue = due < today && !task.completed;
            let class = if overdue {
                "task-date overdue"
            } else {
                "task-date"
            };
            format!(r#"<span class="{}">{}</span>"#, class, due)
        }
        None => String::new(),
    };

    format!(
        r##"<div class="task-row{done}">
            <input type="checkbox"{checked}
                   hx-post="/fragments/tasks/{id}/toggle?completed={next}&view={view}"
                   hx-target="#task-panel">
            <span class="task-title">{title}</span>
            {date_badge}
            <button class="delete-btn" title="Delete"
                    hx-delete="/fragments/tasks/{id}?view={view}"
                    hx-target="#task-panel">&times;</button>
        </div>"##,
        done = done_class,
        checked = checked,
        id = task.id,
        next = !task.completed,
        view = view_token,
        title = html_escape(&task.title),
        date_badge = date_badge,
    )
}

/// Render the full task panel for a view. The panel re-fetches itself
/// periodically with its own view baked in, so the active view survives
/// the refresh.
async fn render_task_panel(state: &AppServer, view: Option<View>, error: Option<&str>) -> String {
    let tasks = state.gateway.list_tasks(view.as_ref()).await;
    let lists = state.gateway.list_lists().await;

    let view_token = view.as_ref().map(|v| v.token().to_string()).unwrap_or_default();
    let title = view_title(&view, &lists);

    let mut html = format!(
        r##"<div hx-get="/fragments/tasks?view={view}" hx-trigger="every 5s" hx-target="#task-panel">
            <h2 class="view-title">{title}</h2>
            <form class="add-form" hx-post="/fragments/tasks" hx-target="#task-panel">
                <input type="hidden" name="view" value="{view}">
                <input type="text" name="title" placeholder="Add a task..." autocomplete="off">
                <button class="primary" type="submit">Add</button>
            </form>"##,
        view = view_token,
        title = title,
    );

    if let Some(message) = error {
        html.push_str(&format!(
            r#"<div class="empty-state">{}</div>"#,
            html_escape(message)
        ));
    }

    if tasks.is_empty() {
        html.push_str(r#"<div class="empty-state">No tasks</div>"#);
    } else {
        for task in &tasks {
            html.push_str(&render_task_row(task, &view_token));
        }
    }

    html.push_str("</div>");
    html
}

async fn fragment_tasks(
    State(state): State<AppServer>,
    Query(query): Query<ViewQuery>,
) -> Html<String> {
    Html(render_task_panel(&state, query.parse(), None).await)
}

#[derive(Deserialize)]
struct NewTaskForm {
    title: String,
    #[serde(default)]
    view: String,
}

async fn fragment_task_create(
    State(state): State<AppServer>,
    Form(form): Form<NewTaskForm>,
) -> Html<String> {
    let view = (!form.view.is_empty()).then(|| View::parse(&form.view));
    let list_id = match &view {
        Some(View::ByList(id)) => Some(id.clone()),
        _ => None,
    };

    let error = state
        .gateway
        .create_task(&form.title, list_id, view.as_ref())
        .await
        .err();

    Html(render_task_panel(&state, view, error.as_ref().map(|e| e.message.as_str())).await)
}

#[derive(Deserialize)]
struct ToggleQuery {
    completed: bool,
    view: Option<String>,
}

async fn fragment_task_toggle(
    State(state): State<AppServer>,
    Path(task_id): Path<String>,
    Query(query): Query<ToggleQuery>,
) -> Html<String> {
    let view = query.view.as_deref().filter(|v| !v.is_empty()).map(View::parse);
    let error = state
        .gateway
        .toggle_task(&task_id, query.completed)
        .await
        .err();

    Html(render_task_panel(&state, view, error.as_ref().map(|e| e.message.as_str())).await)
}

async fn fragment_task_delete(
    State(state): State<AppServer>,
    Path(task_id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Html<String> {
    let error = state.gateway.delete_task(&task_id).await.err();

    Html(render_task_panel(&state, query.parse(), error.as_ref().map(|e| e.message.as_str())).await)
}

async fn render_list_panel(state: &AppServer) -> String {
    let lists = state.gateway.list_lists().await;

    if lists.is_empty() {
        return r#"<div class="empty-state">No lists yet</div>"#.to_string();
    }

    let mut html = String::new();
    for list in &lists {
        let dot_style = list
            .color
            .as_deref()
            .map(|c| format!(r#" style="background: {}""#, html_escape(c)))
            .unwrap_or_default();

        html.push_str(&format!(
            r##"<div class="task-row">
                <button class="nav-item" hx-get="/fragments/tasks?view={id}" hx-target="#task-panel">
                    <span class="list-dot"{dot_style}></span>{name}
                </button>
                <button class="delete-btn" title="Delete list"
                        hx-delete="/fragments/lists/{id}"
                        hx-target="#list-panel">&times;</button>
            </div>"##,
            id = list.id,
            dot_style = dot_style,
            name = html_escape(&list.name),
        ));
    }
    html
}

async fn fragment_lists(State(state): State<AppServer>) -> Html<String> {
    Html(render_list_panel(&state).await)
}

#[derive(Deserialize)]
struct NewListForm {
    name: String,
}

async fn fragment_list_create(
    State(state): State<AppServer>,
    Form(form): Form<NewListForm>,
) -> Html<String> {
    // Validation failures just leave the sidebar unchanged.
    let _ = state.gateway.create_list(&form.name, None).await;
    Html(render_list_panel(&state).await)
}

async fn fragment_list_delete(
    State(state): State<AppServer>,
    Path(list_id): Path<String>,
) -> Html<String> {
    let _ = state.gateway.delete_list(&list_id).await;
    Html(render_list_panel(&state).await)
}

// =============================================================================
// JSON API
// =============================================================================

async fn api_tasks(
    State(state): State<AppServer>,
    Query(query): Query<ViewQuery>,
) -> Json<Vec<Task>> {
    Json(state.gateway.list_tasks(query.parse().as_ref()).await)
}

#[derive(Deserialize)]
struct CreateTaskBody {
    title: String,
    list_id: Option<String>,
    /// Active view selector, so a task created from "today" lands there.
    view: Option<String>,
}

async fn api_task_create(
    State(state): State<AppServer>,
    Json(body): Json<CreateTaskBody>,
) -> Json<ApiResponse<Task>> {
    let view = body.view.as_deref().map(View::parse);
    let result = state
        .gateway
        .create_task(&body.title, body.list_id, view.as_ref())
        .await;
    Json(ApiResponse::from_result(result))
}

async fn api_task_update(
    State(state): State<AppServer>,
    Path(task_id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Json<ApiResponse<Task>> {
    let result = state.gateway.update_task(&task_id, &patch).await;
    Json(ApiResponse::from_result(result))
}

#[derive(Deserialize)]
struct ToggleBody {
    completed: bool,
}

async fn api_task_toggle(
    State(state): State<AppServer>,
    Path(task_id): Path<String>,
    Json(body): Json<ToggleBody>,
) -> Json<ApiResponse<Task>> {
    let result = state.gateway.toggle_task(&task_id, body.completed).await;
    Json(ApiResponse::from_result(result))
}

async fn api_task_delete(
    State(state): State<AppServer>,
    Path(task_id): Path<String>,
) -> Json<ApiResponse<()>> {
    Json(ApiResponse::from_result(
        state.gateway.delete_task(&task_id).await,
    ))
}

async fn api_lists(State(state): State<AppServer>) -> Json<Vec<List>> {
    Json(state.gateway.list_lists().await)
}

#[derive(Deserialize)]
struct CreateListBody {
    name: String,
    color: Option<String>,
}

async fn api_list_create(
    State(state): State<AppServer>,
    Json(body): Json<CreateListBody>,
) -> Json<ApiResponse<List>> {
    let result = state.gateway.create_list(&body.name, body.color).await;
    Json(ApiResponse::from_result(result))
}

async fn api_list_delete(
    State(state): State<AppServer>,
    Path(list_id): Path<String>,
) -> Json<ApiResponse<()>> {
    Json(ApiResponse::from_result(
        state.gateway.delete_list(&list_id).await,
    ))
}

fn build_router(state: AppServer) -> Router {
    // Configure CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Page routes
        .route("/", get(root))
        // htmx fragment routes (panel swaps + periodic refresh)
        .route("/fragments/tasks", get(fragment_tasks).post(fragment_task_create))
        .route("/fragments/tasks/{task_id}/toggle", post(fragment_task_toggle))
        .route("/fragments/tasks/{task_id}", delete(fragment_task_delete))
        .route("/fragments/lists", get(fragment_lists).post(fragment_list_create))
        .route("/fragments/lists/{list_id}", delete(fragment_list_delete))
        // JSON API
        .route("/api/tasks", get(api_tasks).post(api_task_create))
        .route(
            "/api/tasks/{task_id}",
            patch(api_task_update).delete(api_task_delete),
        )
        .route("/api/tasks/{task_id}/toggle", post(api_task_toggle))
        .route("/api/lists", get(api_lists).post(api_list_create))
        .route("/api/lists/{list_id}", delete(api_list_delete))
        .route("/api/revision", get(api_revision))
        .route("/api/health", get(health))
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the specified port.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    gateway: SqliteGateway,
    feed: Arc<ChangeFeed>,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let state = AppServer::new(gateway, feed);
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Web UI listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Web UI shutting down");
            })
            .await
        {
            tracing::error!("Web UI server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn test_api_response_envelope() {
        let ok: ApiResponse<i32> = ApiResponse::from_result(Ok(7));
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains(r#""error":null"#));
        assert!(json.contains(r#""data":7"#));

        let err: ApiResponse<i32> =
            ApiResponse::from_result(Err(StoreError::task_not_found("t1")));
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("TASK_NOT_FOUND"));
        assert!(json.contains(r#""data":null"#));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }
}
