use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::GridError;
use crate::field::{CellId, RowKey};

/// Days shown when the container does not say otherwise
pub const DEFAULT_NUM_DAYS: usize = 7;

/// Read the container's `numDays` attribute, falling back to a full week
pub fn num_days_from_attr(attr: Option<&str>) -> usize {
    attr.and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_NUM_DAYS)
}

/// One grid row: a booking combination and one cell per day column
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    key: RowKey,
    cells: Vec<Cell>,
}

impl Row {
    pub fn key(&self) -> RowKey {
        self.key
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// The timesheet grid.
///
/// Columns are positional: column `i` is `start_date + i` days. Every row
/// holds exactly `num_days` cells, so a [`CellId`] maps to a single slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    start_date: NaiveDate,
    num_days: usize,
    rows: Vec<Row>,
}

impl Grid {
    pub fn new(start_date: NaiveDate, num_days: usize) -> Self {
        Self {
            start_date,
            num_days,
            rows: Vec::new(),
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn num_days(&self) -> usize {
        self.num_days
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The date of a day column
    pub fn date_at(&self, col: usize) -> Option<NaiveDate> {
        if col >= self.num_days {
            return None;
        }
        self.start_date.checked_add_days(Days::new(col as u64))
    }

    /// The day column showing `date`
    pub fn column_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = date.signed_duration_since(self.start_date).num_days();
        usize::try_from(offset).ok().filter(|col| *col < self.num_days)
    }

    fn row_index(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|row| row.key == key)
    }

    /// Append an empty row
    pub fn add_row(&mut self, key: RowKey) -> Result<&Row, GridError> {
        let cells = vec![Cell::default(); self.num_days];
        self.push_row(key, cells)
    }

    /// Append a row with the given raw values, one per day column
    pub fn insert_row<S: Into<String>>(
        &mut self,
        key: RowKey,
        values: Vec<S>,
    ) -> Result<&Row, GridError> {
        if values.len() != self.num_days {
            return Err(GridError::RowWidth {
                row: key.to_string(),
                expected: self.num_days,
                actual: values.len(),
            });
        }
        let cells = values.into_iter().map(Cell::new).collect();
        self.push_row(key, cells)
    }

    fn push_row(&mut self, key: RowKey, cells: Vec<Cell>) -> Result<&Row, GridError> {
        if self.row_index(key).is_some() {
            return Err(GridError::DuplicateRow(key.to_string()));
        }
        self.rows.push(Row { key, cells });
        Ok(&self.rows[self.rows.len() - 1])
    }

    fn position(&self, id: &CellId) -> Option<(usize, usize)> {
        let row = self.row_index(id.row())?;
        let col = self.column_of(id.date())?;
        Some((row, col))
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        let (row, col) = self.position(id)?;
        self.rows[row].cells.get(col)
    }

    /// Store the raw input text of a cell
    pub fn set_raw(&mut self, id: &CellId, raw: impl Into<String>) -> Result<(), GridError> {
        let (row, col) = self
            .position(id)
            .ok_or_else(|| GridError::UnknownCell(id.to_string()))?;
        self.rows[row].cells[col].set_raw(raw);
        Ok(())
    }

    /// The raw input text of a cell, as it would be saved right now
    pub fn raw_value(&self, id: &CellId) -> Option<String> {
        self.cell(id).map(|cell| cell.raw().to_string())
    }

    /// Identifier of the cell at a row/column position
    pub fn cell_id(&self, row: usize, col: usize) -> Option<CellId> {
        let key = self.rows.get(row)?.key;
        Some(CellId::new(key, self.date_at(col)?))
    }

    /// Iterate all cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &Cell)> + '_ {
        self.rows.iter().flat_map(move |row| {
            row.cells.iter().enumerate().filter_map(move |(col, cell)| {
                self.date_at(col)
                    .map(|date| (CellId::new(row.key, date), cell))
            })
        })
    }

    pub fn cell_ids(&self) -> Vec<CellId> {
        self.cells().map(|(id, _)| id).collect()
    }

    /// Cells holding a positive value, with the raw text to save.
    ///
    /// Empty and zero cells are left out.
    pub fn flush_candidates(&self) -> Vec<(CellId, String)> {
        self.cells()
            .filter(|(_, cell)| cell.value().is_positive())
            .map(|(id, cell)| (id, cell.raw().to_string()))
            .collect()
    }
}

/// Serialized grid layout, as rendered by the page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDescription {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub num_days: Option<String>,
    #[serde(default)]
    pub rows: Vec<RowDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RowDescription {
    pub project: u64,
    #[serde(default)]
    pub task: Option<u64>,
    #[serde(default)]
    pub activity: Option<u64>,
    #[serde(default)]
    pub hours: Vec<String>,
}

impl GridDescription {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build the grid. Short `hours` lists are padded with empty cells.
    pub fn into_grid(self) -> Result<Grid, GridError> {
        let num_days = num_days_from_attr(self.num_days.as_deref());
        let mut grid = Grid::new(self.start_date, num_days);

        for row in self.rows {
            let key = RowKey::new(row.project, row.task, row.activity);
            let mut hours = row.hours;
            if hours.len() < num_days {
                hours.resize(num_days, String::new());
            }
            grid.insert_row(key, hours)?;
        }

        Ok(grid)
    }
}
