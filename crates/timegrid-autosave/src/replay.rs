use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use timegrid_core::{field::parse_optional_id, CellId, GridDescription, RowKey};

use crate::config::Config;
use crate::editor::TimesheetEditor;
use crate::error::AutosaveError;
use crate::transport::HttpTransport;
use crate::view::TracingView;

/// One line of an edit script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayCommand {
    /// `set <field> <value>`: type a value into a cell
    Set(CellId, String),
    /// `clear <field>`: empty a cell
    Clear(CellId),
    /// `blur <field>`: leave a cell, saving it immediately
    Blur(CellId),
    /// `wait <ms>`
    Wait(Duration),
    /// `add_row <project> <task|None> <activity|None>`
    AddRow(RowKey),
    /// `totals`: log the current totals
    Totals,
}

impl ReplayCommand {
    /// Parse a script line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, AutosaveError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let invalid = || AutosaveError::Replay(line.to_string());
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(invalid)?;
        let args: Vec<&str> = words.collect();
        let field = |index: usize| -> Result<CellId, AutosaveError> {
            Ok(args.get(index).ok_or_else(invalid)?.parse()?)
        };

        let command = match (verb, args.len()) {
            ("set", 1) => ReplayCommand::Set(field(0)?, String::new()),
            ("set", 2) => ReplayCommand::Set(field(0)?, args[1].to_string()),
            ("clear", 1) => ReplayCommand::Clear(field(0)?),
            ("blur", 1) => ReplayCommand::Blur(field(0)?),
            ("wait", 1) => {
                let ms = args[0].parse().map_err(|_| invalid())?;
                ReplayCommand::Wait(Duration::from_millis(ms))
            }
            ("add_row", 3) => {
                let project = args[0].parse().map_err(|_| invalid())?;
                let task = parse_optional_id(args[1]).ok_or_else(invalid)?;
                let activity = parse_optional_id(args[2]).ok_or_else(invalid)?;
                ReplayCommand::AddRow(RowKey::new(project, task, activity))
            }
            ("totals", 0) => ReplayCommand::Totals,
            _ => return Err(invalid()),
        };

        Ok(Some(command))
    }

    /// Run the command against an editor
    pub async fn apply(self, editor: &TimesheetEditor) -> Result<(), AutosaveError> {
        match self {
            ReplayCommand::Set(cell, value) => {
                editor.on_input(&cell, &value).await?;
            }
            ReplayCommand::Clear(cell) => {
                editor.on_input(&cell, "").await?;
            }
            ReplayCommand::Blur(cell) => {
                editor.on_blur(&cell).await?;
            }
            ReplayCommand::Wait(duration) => tokio::time::sleep(duration).await,
            ReplayCommand::AddRow(key) => {
                let report = editor.add_row(key).await?;
                if let Err(e) = report.submission {
                    tracing::warn!(row = %key, "Add row was not accepted: {}", e);
                }
            }
            ReplayCommand::Totals => {
                let totals = editor.totals().await;
                tracing::info!(
                    grand_total = %totals.grand_total,
                    rows = ?totals.row_totals,
                    days = ?totals.column_totals,
                    "Current totals"
                );
            }
        }
        Ok(())
    }
}

/// Replay every command read from `input`, then wait for pending saves
pub async fn replay_script<R>(editor: &TimesheetEditor, input: R) -> Result<(), AutosaveError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AutosaveError::Replay(e.to_string()))?
    {
        line_no += 1;
        let result = match ReplayCommand::parse(&line) {
            Ok(Some(command)) => command.apply(editor).await,
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(line = line_no, "Skipping command: {}", e);
        }
    }

    editor.settle().await;
    Ok(())
}

/// Build an editor from configuration and replay stdin against the live endpoint
pub async fn run_replay(config: Config) -> anyhow::Result<()> {
    let path = config
        .grid_file
        .clone()
        .ok_or_else(|| AutosaveError::Config("TIMEGRID_GRID_FILE is not set".to_string()))?;
    let json = tokio::fs::read_to_string(&path).await?;
    let grid = GridDescription::from_json(&json)?.into_grid()?;

    let engine = config.engine()?;
    let transport = Arc::new(HttpTransport::new(&config, &engine.token)?);
    let editor = TimesheetEditor::new(grid, transport, Arc::new(TracingView), engine);

    tracing::info!(endpoint = %config.endpoint, grid = %path.display(), "Replaying edits");
    editor.load().await;
    replay_script(&editor, BufReader::new(tokio::io::stdin())).await?;

    Ok(())
}
