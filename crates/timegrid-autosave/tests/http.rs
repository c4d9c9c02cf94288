mod common;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Form, Router,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use common::grid;
use timegrid_autosave::{Config, HttpTransport, MemoryView, TimesheetEditor};
use timegrid_core::{RowKey, SaveIndicator};

const COOKIE: &str = "sessionid=abc; csrftoken=cookie-token";

#[derive(Debug, Clone)]
struct Received {
    fields: Vec<(String, String)>,
    token_header: Option<String>,
    cookie: Option<String>,
}

impl Received {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

type Log = Arc<Mutex<Vec<Received>>>;

async fn record(
    State(log): State<Log>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> StatusCode {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    log.lock().unwrap().push(Received {
        fields,
        token_header: header("x-csrftoken"),
        cookie: header("cookie"),
    });
    StatusCode::OK
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Start a persistence endpoint on an ephemeral port
async fn spawn_endpoint() -> (String, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/timesheet/1/timesheet_action/", post(record))
        .route("/broken/timesheet_action/", post(broken))
        .with_state(log.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), log)
}

fn http_editor(endpoint: &str) -> (TimesheetEditor, Arc<MemoryView>) {
    let config = Config::from_lookup(|key| match key {
        "TIMEGRID_ENDPOINT" => Some(endpoint.to_string()),
        "TIMEGRID_COOKIE" => Some(COOKIE.to_string()),
        "TIMEGRID_REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();
    let engine = config
        .engine()
        .unwrap()
        .with_debounce(Duration::from_millis(50));
    let transport = Arc::new(HttpTransport::new(&config, &engine.token).unwrap());
    let view = Arc::new(MemoryView::new());
    let editor = TimesheetEditor::new(
        grid(2, &[&["", ""]]),
        transport,
        view.clone(),
        engine,
    );
    (editor, view)
}

#[tokio::test]
async fn saves_post_form_fields_with_token_and_cookie() {
    let (base, log) = spawn_endpoint().await;
    let (editor, _view) = http_editor(&format!("{}/timesheet/1/timesheet_action/", base));
    let cell = editor.grid().await.cell_id(0, 1).unwrap();

    editor.on_input(&cell, "7,5").await.unwrap();
    editor.settle().await;

    let received = log.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    let request = &received[0];
    assert_eq!(request.field("action"), Some("save_grid"));
    assert_eq!(request.field("csrfmiddlewaretoken"), Some("cookie-token"));
    assert_eq!(request.field(&cell.field_name()), Some("7,5"));
    assert_eq!(request.token_header.as_deref(), Some("cookie-token"));
    assert_eq!(request.cookie.as_deref(), Some(COOKIE));
    assert_eq!(editor.indicator(&cell), SaveIndicator::Success);
}

#[tokio::test]
async fn server_error_marks_the_cell_failed() {
    let (base, _log) = spawn_endpoint().await;
    let (editor, view) = http_editor(&format!("{}/broken/timesheet_action/", base));
    let cell = editor.grid().await.cell_id(0, 0).unwrap();

    editor.on_input(&cell, "2").await.unwrap();
    let outcome = editor.on_blur(&cell).await.unwrap();
    assert!(!outcome.is_success());
    assert_eq!(view.indicator(&cell), SaveIndicator::Failure);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_failure_not_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (editor, _view) = http_editor(&format!("http://{}/timesheet/1/timesheet_action/", addr));
    let cell = editor.grid().await.cell_id(0, 0).unwrap();
    editor.on_input(&cell, "1").await.unwrap();

    let outcome = editor.on_blur(&cell).await.unwrap();
    assert!(!outcome.is_success());
    assert_eq!(editor.indicator(&cell), SaveIndicator::Failure);
}

#[tokio::test]
async fn add_row_reaches_the_server_after_flushed_saves() {
    let (base, log) = spawn_endpoint().await;
    let (editor, _view) = http_editor(&format!("{}/timesheet/1/timesheet_action/", base));
    let monday = editor.grid().await.cell_id(0, 0).unwrap();
    let tuesday = editor.grid().await.cell_id(0, 1).unwrap();

    editor.on_input(&monday, "3").await.unwrap();
    editor.on_input(&tuesday, "4").await.unwrap();
    let report = editor.add_row(RowKey::new(2, None, Some(5))).await.unwrap();
    assert!(report.submitted());
    assert_eq!(report.flushed.len(), 2);

    let received = log.lock().unwrap().clone();
    assert_eq!(received.len(), 3);
    assert!(received[..2]
        .iter()
        .all(|r| r.field("action") == Some("save_grid")));
    assert_eq!(received[2].field("action"), Some("add_row"));
    assert_eq!(received[2].field("activity"), Some("5"));
    assert_eq!(editor.grid().await.rows().len(), 2);
    assert!(editor.pending_saves().is_empty());
}
