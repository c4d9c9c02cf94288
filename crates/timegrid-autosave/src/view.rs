use std::collections::HashMap;
use std::sync::Mutex;

use timegrid_core::{CellId, SaveIndicator, TotalsView};

use crate::lock;

/// Presentation adapter the engine pushes derived state into
pub trait GridView: Send + Sync {
    /// Row, column and grand totals plus the `totalHours` attribute
    fn render_totals(&self, totals: &TotalsView);

    /// A cell's save indicator changed
    fn render_indicator(&self, cell: &CellId, indicator: SaveIndicator);
}

/// Logs every render through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingView;

impl GridView for TracingView {
    fn render_totals(&self, totals: &TotalsView) {
        tracing::info!(
            grand_total = %totals.grand_total,
            rows = ?totals.row_totals,
            days = ?totals.column_totals,
            "Totals updated"
        );
    }

    fn render_indicator(&self, cell: &CellId, indicator: SaveIndicator) {
        tracing::debug!(%cell, ?indicator, "Indicator updated");
    }
}

/// Keeps the last rendered state in memory, for headless use
#[derive(Debug, Default)]
pub struct MemoryView {
    totals: Mutex<TotalsView>,
    indicators: Mutex<HashMap<CellId, SaveIndicator>>,
    history: Mutex<Vec<(CellId, SaveIndicator)>>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self) -> TotalsView {
        lock(&self.totals).clone()
    }

    /// The `totalHours` attribute value
    pub fn total_hours(&self) -> String {
        lock(&self.totals).total_hours.clone()
    }

    pub fn indicator(&self, cell: &CellId) -> SaveIndicator {
        lock(&self.indicators).get(cell).copied().unwrap_or_default()
    }

    /// Every indicator render in order
    pub fn indicator_history(&self) -> Vec<(CellId, SaveIndicator)> {
        lock(&self.history).clone()
    }
}

impl GridView for MemoryView {
    fn render_totals(&self, totals: &TotalsView) {
        *lock(&self.totals) = totals.clone();
    }

    fn render_indicator(&self, cell: &CellId, indicator: SaveIndicator) {
        lock(&self.indicators).insert(cell.clone(), indicator);
        lock(&self.history).push((cell.clone(), indicator));
    }
}
