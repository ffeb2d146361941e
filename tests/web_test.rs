//! HTTP round-trips against a server bound on an ephemeral port.

use chrono::{Duration, NaiveDateTime, Timelike};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tempfile::TempDir;
use todo_reminder::alerts::AlertFeed;
use todo_reminder::tasks::{local_now, SqliteTaskStore, Task, TaskStore};
use todo_reminder::web::{self, AppState};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    base: String,
    client: Client,
    db_path: std::path::PathBuf,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    _dir: TempDir,
}

impl TestServer {
    async fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("tasks.db");
        let store: Arc<dyn TaskStore + Send + Sync> =
            Arc::new(SqliteTaskStore::new(&db_path).unwrap());
        let state = AppState::new(store, Arc::new(AlertFeed::default()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            web::serve(listener, state, async move {
                let _ = stopped.await;
            })
            .await
            .unwrap();
        });

        let client = Client::builder().redirect(Policy::none()).build().unwrap();
        Self {
            base: format!("http://{addr}"),
            client,
            db_path,
            stop: Some(stop),
            handle: Some(handle),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn create(&self, form: &[(&str, String)]) -> reqwest::Response {
        self.client.post(self.url("/tasks")).form(form).send().await.unwrap()
    }

    async fn api_tasks(&self, view: &str) -> Vec<Task> {
        self.client
            .get(self.url(&format!("/api/tasks?view={view}")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap();
        }
    }
}

fn task_form(title: &str, deadline: NaiveDateTime, notify: NaiveDateTime) -> Vec<(&'static str, String)> {
    vec![
        ("title", title.to_string()),
        ("assignee", "Sam".to_string()),
        ("designation", "Manager".to_string()),
        ("priority", "High".to_string()),
        ("deadline_date", deadline.format("%Y-%m-%d").to_string()),
        ("deadline_time", deadline.format("%H:%M").to_string()),
        ("notify_date", notify.format("%Y-%m-%d").to_string()),
        ("notify_time", notify.format("%H:%M").to_string()),
    ]
}

fn location(response: &reqwest::Response) -> &str {
    response.headers().get("location").unwrap().to_str().unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start().await;
    let body: serde_json::Value =
        server.client.get(server.url("/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
    server.stop().await;
}

#[tokio::test]
async fn test_empty_page_renders() {
    let server = TestServer::start().await;
    let response = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("No tasks to show."));
    assert!(body.contains("Due within 1 day"));
    server.stop().await;
}

#[tokio::test]
async fn test_create_redirects_and_lists_task() {
    let server = TestServer::start().await;
    let now = local_now();

    let response =
        server.create(&task_form("Book flights", now + Duration::days(2), now + Duration::days(1))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?view=all&flash=created");

    let page = server.client.get(server.url("/?flash=created")).send().await.unwrap();
    let body = page.text().await.unwrap();
    assert!(body.contains("Task added successfully!"));
    assert!(body.contains("Book flights"));
    assert!(body.contains("Sam (Manager)"));

    let tasks = server.api_tasks("all").await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Book flights");
    assert!(!tasks[0].completed);
    server.stop().await;
}

#[tokio::test]
async fn test_past_deadline_rerenders_with_error() {
    let server = TestServer::start().await;
    let now = local_now();

    let response = server
        .create(&task_form("Yesterday's job", now - Duration::days(1), now - Duration::days(2)))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text().await.unwrap();
    assert!(body.contains("is in the past"));
    assert!(body.contains("value=\"Yesterday&#x27;s job\""));

    assert!(server.api_tasks("all").await.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_current_minute_is_already_past() {
    let server = TestServer::start().await;
    let mut now = local_now();
    if now.second() == 0 {
        // Make sure "now" has moved past the start of the minute.
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        now = local_now();
    }

    let response = server.create(&task_form("This minute", now, now)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("is in the past"));
    assert!(server.api_tasks("all").await.is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_actions_keep_the_selected_view() {
    let server = TestServer::start().await;
    let now = local_now();

    let mut form = task_form("Soon", now + Duration::hours(3), now + Duration::hours(1));
    form.push(("view", "due".to_string()));
    let response = server.create(&form).await;
    assert_eq!(location(&response), "/?view=due&flash=created");

    let page = server.client.get(server.url("/?view=due")).send().await.unwrap();
    let body = page.text().await.unwrap();
    assert!(body.contains("name=\"view\" value=\"due\""));

    let id = server.api_tasks("due").await[0].id;
    assert!(body.contains(&format!("/tasks/{id}/complete?view=due")));
    let response = server
        .client
        .post(server.url(&format!("/tasks/{id}/complete?view=due")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/?view=due&flash=completed");

    let mut rejected = task_form("Too late", now - Duration::days(1), now - Duration::days(2));
    rejected.push(("view", "completed".to_string()));
    let response = server.create(&rejected).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response.text().await.unwrap();
    assert!(body.contains("<h2>Completed Tasks</h2>"));
    assert!(body.contains("name=\"view\" value=\"completed\""));
    server.stop().await;
}

#[tokio::test]
async fn test_unparsable_date_is_rejected() {
    let server = TestServer::start().await;
    let now = local_now();
    let mut form = task_form("Bad date", now + Duration::days(1), now);
    form[4].1 = "not-a-date".to_string();

    let response = server.create(&form).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("Invalid deadline"));
    server.stop().await;
}

#[tokio::test]
async fn test_complete_and_views() {
    let server = TestServer::start().await;
    let now = local_now();
    server.create(&task_form("Soon", now + Duration::hours(3), now + Duration::hours(1))).await;
    server.create(&task_form("Later", now + Duration::days(5), now + Duration::days(4))).await;

    let due = server.api_tasks("due").await;
    assert_eq!(due.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), vec!["Soon"]);

    let id = due[0].id;
    let response =
        server.client.post(server.url(&format!("/tasks/{id}/complete"))).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?view=all&flash=completed");

    let completed = server.api_tasks("completed").await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, id);
    assert!(server.api_tasks("due").await.is_empty());

    // Completing again is a no-op.
    let again =
        server.client.post(server.url(&format!("/tasks/{id}/complete"))).send().await.unwrap();
    assert_eq!(location(&again), "/?view=all&flash=completed");
    assert_eq!(server.api_tasks("completed").await.len(), 1);

    let page = server.client.get(server.url("/?view=completed")).send().await.unwrap();
    let body = page.text().await.unwrap();
    assert!(body.contains("Soon"));
    assert!(!body.contains("Later"));
    server.stop().await;
}

#[tokio::test]
async fn test_complete_missing_task() {
    let server = TestServer::start().await;
    let response = server.client.post(server.url("/tasks/999/complete")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?view=all&flash=not_found");

    let body = server.client.get(server.url("/?flash=not_found")).send().await.unwrap();
    assert!(body.text().await.unwrap().contains("That task no longer exists."));
    server.stop().await;
}

#[tokio::test]
async fn test_titles_are_escaped() {
    let server = TestServer::start().await;
    let now = local_now();
    server
        .create(&task_form("<b>bold</b>", now + Duration::days(1), now + Duration::hours(1)))
        .await;

    let body = server.client.get(server.url("/")).send().await.unwrap().text().await.unwrap();
    assert!(!body.contains("<b>bold</b>"));
    assert!(body.contains("&lt;b&gt;bold&lt;&#x2F;b&gt;"));
    server.stop().await;
}

#[tokio::test]
async fn test_database_failure_is_generic_500() {
    let server = TestServer::start().await;

    std::fs::remove_file(&server.db_path).unwrap();
    for suffix in ["-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", server.db_path.display()));
    }
    std::fs::create_dir(&server.db_path).unwrap();

    let response = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text().await.unwrap();
    assert!(body.contains("unavailable"));
    assert!(!body.contains("Database error"));

    let api = server.client.get(server.url("/api/tasks")).send().await.unwrap();
    assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    server.stop().await;
}
