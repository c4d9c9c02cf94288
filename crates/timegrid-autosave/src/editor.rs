use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use timegrid_core::{
    CellId, CsrfToken, Grid, GridError, RowKey, SaveIndicator, SaveOutcome, StructuralForm,
    Totals, TotalsView,
};

use crate::client::FieldSaveClient;
use crate::config::EngineConfig;
use crate::error::AutosaveError;
use crate::flush::{FlushCoordinator, FlushReport};
use crate::indicators::IndicatorState;
use crate::scheduler::DebounceScheduler;
use crate::transport::SaveTransport;
use crate::view::GridView;

/// The timesheet grid editor: grid state, per-cell auto-save and the
/// flush-before-navigate hook for structural forms.
pub struct TimesheetEditor {
    grid: Arc<RwLock<Grid>>,
    scheduler: Arc<DebounceScheduler>,
    client: Arc<FieldSaveClient>,
    indicators: Arc<IndicatorState>,
    flush: FlushCoordinator,
    view: Arc<dyn GridView>,
    endpoint: String,
    token: CsrfToken,
}

impl TimesheetEditor {
    pub fn new(
        grid: Grid,
        transport: Arc<dyn SaveTransport>,
        view: Arc<dyn GridView>,
        config: EngineConfig,
    ) -> Self {
        let grid = Arc::new(RwLock::new(grid));
        let scheduler = Arc::new(DebounceScheduler::new(config.debounce));
        let indicators = Arc::new(IndicatorState::new(
            Arc::clone(&view),
            config.success_display,
        ));
        let client = Arc::new(FieldSaveClient::new(
            Arc::clone(&transport),
            config.endpoint.clone(),
            config.token.clone(),
            Arc::clone(&indicators),
        ));
        let flush = FlushCoordinator::new(
            Arc::clone(&grid),
            Arc::clone(&scheduler),
            Arc::clone(&client),
            transport,
        );

        Self {
            grid,
            scheduler,
            client,
            indicators,
            flush,
            view,
            endpoint: config.endpoint,
            token: config.token,
        }
    }

    /// Render the initial totals
    pub async fn load(&self) -> TotalsView {
        let totals = self.totals().await;
        self.view.render_totals(&totals);
        totals
    }

    pub async fn totals(&self) -> TotalsView {
        Totals::compute(&*self.grid.read().await).view()
    }

    /// A copy of the current grid state
    pub async fn grid(&self) -> Grid {
        self.grid.read().await.clone()
    }

    pub fn indicator(&self, cell: &CellId) -> SaveIndicator {
        self.indicators.get(cell)
    }

    /// Cells waiting for their debounce to expire
    pub fn pending_saves(&self) -> Vec<CellId> {
        self.scheduler.pending()
    }

    /// The user changed a cell's input.
    ///
    /// Totals are recomputed before this returns; the save itself waits for
    /// the debounce and sends whatever the cell holds when it expires.
    pub async fn on_input(&self, cell: &CellId, raw: &str) -> Result<TotalsView, AutosaveError> {
        let totals = {
            let mut grid = self.grid.write().await;
            grid.set_raw(cell, raw)?;
            Totals::compute(&grid).view()
        };
        self.view.render_totals(&totals);
        self.indicators.reset(cell);
        self.schedule_save(cell.clone());
        Ok(totals)
    }

    /// Wait until no debounced save is armed or still running
    pub async fn settle(&self) {
        let poll = (self.scheduler.delay() / 10).max(Duration::from_millis(1));
        while !self.scheduler.is_idle() {
            tokio::time::sleep(poll).await;
        }
    }

    fn schedule_save(&self, cell: CellId) {
        let grid = Arc::clone(&self.grid);
        let client = Arc::clone(&self.client);
        let id = cell.clone();
        self.scheduler.schedule(cell, move || async move {
            let raw = grid.read().await.raw_value(&id);
            match raw {
                Some(raw) => {
                    client.save(&id, &raw).await;
                }
                None => tracing::warn!(cell = %id, "Cell disappeared before its save"),
            }
        });
    }

    /// The cell's input lost focus: save now instead of waiting
    pub async fn on_blur(&self, cell: &CellId) -> Result<SaveOutcome, AutosaveError> {
        self.scheduler.cancel(cell);
        let raw = self
            .grid
            .read()
            .await
            .raw_value(cell)
            .ok_or_else(|| GridError::UnknownCell(cell.to_string()))?;
        Ok(self.client.save(cell, &raw).await)
    }

    /// Submit a page form. Add-row forms are held back until pending data is flushed.
    pub async fn submit_form(&self, form: &StructuralForm) -> FlushReport {
        if form.is_intercepted() {
            return self.flush.flush_then_submit(form).await;
        }

        FlushReport {
            intercepted: false,
            flushed: Vec::new(),
            submission: self.flush.submit(form).await,
        }
    }

    /// Ask the server for a new row and show it once the submission went through
    pub async fn add_row(&self, key: RowKey) -> Result<FlushReport, AutosaveError> {
        let form = StructuralForm::add_row(self.endpoint.clone(), key, &self.token);
        let report = self.submit_form(&form).await;

        if report.submitted() {
            let totals = {
                let mut grid = self.grid.write().await;
                grid.add_row(key)?;
                Totals::compute(&grid).view()
            };
            self.view.render_totals(&totals);
        }

        Ok(report)
    }
}
