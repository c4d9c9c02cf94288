mod common;

use std::time::Duration;
use tokio::time::{sleep, Instant};

use common::{cell, editor, grid, RecordingTransport, Reply, ENDPOINT, TOKEN};
use timegrid_core::{CsrfToken, RowKey, StructuralForm};

fn add_row_form() -> StructuralForm {
    StructuralForm::add_row(ENDPOINT, RowKey::new(9, None, Some(10)), &CsrfToken::new(TOKEN))
}

#[tokio::test(start_paused = true)]
async fn add_row_flushes_only_positive_cells_before_submitting() {
    let transport = RecordingTransport::new();
    let (editor, _view) = editor(grid(3, &[&["", "", ""]]), transport.clone());
    let four = cell(&editor, 0, 0).await;
    let zero = cell(&editor, 0, 1).await;
    let cleared = cell(&editor, 0, 2).await;

    editor.on_input(&four, "4").await.unwrap();
    editor.on_input(&zero, "0").await.unwrap();
    editor.on_input(&cleared, "").await.unwrap();

    let report = editor.submit_form(&add_row_form()).await;
    assert!(report.intercepted);
    assert!(report.submitted());
    assert_eq!(report.flushed.len(), 1);
    assert_eq!(report.flushed[0].0, four);
    assert!(report.flushed[0].1.is_success());

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].action(), Some("save_grid"));
    assert_eq!(requests[0].field(&four.field_name()), Some("4"));
    assert_eq!(requests[1].action(), Some("add_row"));
    assert_eq!(requests[1].field("project"), Some("9"));

    // The flushed cell's debounce was cancelled; the others still run theirs
    sleep(Duration::from_secs(1)).await;
    assert_eq!(transport.saves_of(&four), vec!["4"]);
    assert_eq!(transport.saves_of(&zero), vec!["0"]);
    assert_eq!(transport.saves_of(&cleared), vec![String::new()]);
}

#[tokio::test(start_paused = true)]
async fn flush_saves_run_concurrently() {
    let transport = RecordingTransport::with_latency(Duration::from_millis(1000));
    let (editor, _view) = editor(grid(3, &[&["1", "2", "3"]]), transport.clone());

    let started = Instant::now();
    let report = editor.submit_form(&add_row_form()).await;

    assert_eq!(report.flushed.len(), 3);
    // Three saves in parallel plus the submission, not four round trips
    assert!(started.elapsed() < Duration::from_millis(2500));
    let requests = transport.requests();
    assert_eq!(requests.last().and_then(|r| r.action()), Some("add_row"));
}

#[tokio::test(start_paused = true)]
async fn failed_flush_saves_do_not_block_the_submission() {
    let transport = RecordingTransport::new();
    transport.reply_to("save_grid", Reply::Status(500));
    let (editor, _view) = editor(grid(2, &[&["4", "5"]]), transport.clone());

    let report = editor.submit_form(&add_row_form()).await;
    assert_eq!(report.flushed.len(), 2);
    assert!(report.flushed.iter().all(|(_, outcome)| !outcome.is_success()));
    assert!(report.submitted());

    let requests = transport.requests();
    assert_eq!(requests.last().and_then(|r| r.action()), Some("add_row"));
}

#[tokio::test(start_paused = true)]
async fn crashed_flush_task_is_dropped_and_form_still_submits() {
    let transport = RecordingTransport::new();
    transport.reply_to("save_grid", Reply::Panic);
    let (editor, _view) = editor(grid(2, &[&["4", "5"]]), transport.clone());

    let report = editor.submit_form(&add_row_form()).await;
    assert!(report.intercepted);
    assert!(report.flushed.is_empty());
    assert!(report.submitted());

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests.last().and_then(|r| r.action()), Some("add_row"));
}

#[tokio::test(start_paused = true)]
async fn other_forms_are_not_intercepted() {
    let transport = RecordingTransport::new();
    let (editor, _view) = editor(grid(1, &[&["4"]]), transport.clone());
    let form = StructuralForm::new(
        ENDPOINT,
        vec![
            ("action".to_string(), "delete_row".to_string()),
            ("project_id".to_string(), "1".to_string()),
        ],
    );

    let report = editor.submit_form(&form).await;
    assert!(!report.intercepted);
    assert!(report.flushed.is_empty());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].action(), Some("delete_row"));
}

#[tokio::test(start_paused = true)]
async fn add_row_extends_the_grid_once_accepted() {
    let transport = RecordingTransport::new();
    let (editor, view) = editor(grid(2, &[&["1", "1"]]), transport.clone());

    let report = editor.add_row(RowKey::new(9, Some(4), None)).await.unwrap();
    assert!(report.submitted());
    assert_eq!(editor.grid().await.rows().len(), 2);
    assert_eq!(view.totals().row_totals, vec!["2.0", "0.0"]);

    let requests = transport.requests();
    let submitted = requests.last().unwrap();
    assert_eq!(submitted.field("task"), Some("4"));
    assert_eq!(submitted.field("activity"), Some(""));
    assert_eq!(submitted.field("csrfmiddlewaretoken"), Some(TOKEN));
}

#[tokio::test(start_paused = true)]
async fn rejected_add_row_leaves_the_grid_alone() {
    let transport = RecordingTransport::new();
    transport.reply_to("add_row", Reply::Status(403));
    let (editor, _view) = editor(grid(2, &[&["1", ""]]), transport.clone());

    let report = editor.add_row(RowKey::new(9, None, None)).await.unwrap();
    assert!(report.intercepted);
    assert!(!report.submitted());
    assert_eq!(report.flushed.len(), 1);
    assert_eq!(editor.grid().await.rows().len(), 1);
}
