#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use timegrid_autosave::{AutosaveError, EngineConfig, MemoryView, SaveTransport, TimesheetEditor};
use timegrid_core::{CellId, CsrfToken, Grid, RowKey};

pub const ENDPOINT: &str = "http://timesheet.test/timesheet/1/timesheet_action/";
pub const TOKEN: &str = "test-token";

/// A request seen by the recording transport
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub fields: Vec<(String, String)>,
}

impl Request {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn action(&self) -> Option<&str> {
        self.field("action")
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Status(u16),
    ConnectionError,
    Panic,
}

/// In-memory endpoint that records every request in arrival order
pub struct RecordingTransport {
    requests: Mutex<Vec<Request>>,
    replies: Mutex<HashMap<String, Reply>>,
    latency: Duration,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Self::with_latency(Duration::ZERO)
    }

    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(HashMap::new()),
            latency,
        })
    }

    /// Answer every request with the given `action` this way (default 200)
    pub fn reply_to(&self, action: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(action.to_string(), reply);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// `save_grid` requests carrying a value for `cell`
    pub fn saves_of(&self, cell: &CellId) -> Vec<String> {
        self.requests()
            .iter()
            .filter(|r| r.action() == Some("save_grid"))
            .filter_map(|r| r.field(&cell.field_name()).map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl SaveTransport for RecordingTransport {
    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<u16, AutosaveError> {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            fields: fields.to_vec(),
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let action = fields
            .iter()
            .find(|(key, _)| key == "action")
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&action)
            .copied()
            .unwrap_or(Reply::Status(200));

        match reply {
            Reply::Status(status) => Ok(status),
            Reply::ConnectionError => Err(AutosaveError::Transport("connection refused".into())),
            Reply::Panic => panic!("transport crashed"),
        }
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

/// A grid with one row per entry of `rows`, `num_days` wide
pub fn grid(num_days: usize, rows: &[&[&str]]) -> Grid {
    let mut grid = Grid::new(start_date(), num_days);
    for (i, values) in rows.iter().enumerate() {
        grid.insert_row(RowKey::new(i as u64 + 1, None, Some(10)), values.to_vec())
            .unwrap();
    }
    grid
}

pub fn engine_config(endpoint: &str) -> EngineConfig {
    EngineConfig::new(endpoint, CsrfToken::new(TOKEN))
}

pub fn editor(
    grid: Grid,
    transport: Arc<RecordingTransport>,
) -> (TimesheetEditor, Arc<MemoryView>) {
    let view = Arc::new(MemoryView::new());
    let editor = TimesheetEditor::new(grid, transport, view.clone(), engine_config(ENDPOINT));
    (editor, view)
}

pub async fn cell(editor: &TimesheetEditor, row: usize, col: usize) -> CellId {
    editor.grid().await.cell_id(row, col).unwrap()
}
