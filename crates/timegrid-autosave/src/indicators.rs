use std::sync::{Arc, Mutex};
use std::time::Duration;

use timegrid_core::{CellId, IndicatorBoard, SaveIndicator, SaveOutcome};

use crate::lock;
use crate::view::GridView;

/// Shared indicator board that renders every change and times out success hints
pub struct IndicatorState {
    board: Mutex<IndicatorBoard>,
    view: Arc<dyn GridView>,
    success_display: Duration,
}

impl IndicatorState {
    pub fn new(view: Arc<dyn GridView>, success_display: Duration) -> Self {
        Self {
            board: Mutex::new(IndicatorBoard::new()),
            view,
            success_display,
        }
    }

    pub fn get(&self, cell: &CellId) -> SaveIndicator {
        lock(&self.board).get(cell)
    }

    /// Clear the hint while the user is typing
    pub fn reset(&self, cell: &CellId) {
        let transition = lock(&self.board).reset(cell);
        if transition.changed {
            self.view.render_indicator(cell, transition.state);
        }
    }

    /// Show a settled save. A success reverts to neutral after the display
    /// interval unless something newer happened to the cell in between.
    pub fn record(self: &Arc<Self>, cell: &CellId, outcome: &SaveOutcome) {
        let transition = lock(&self.board).record(cell, outcome);
        self.view.render_indicator(cell, transition.state);

        if transition.state == SaveIndicator::Success {
            let state = Arc::clone(self);
            let cell = cell.clone();
            tokio::spawn(async move {
                tokio::time::sleep(state.success_display).await;
                let expired = lock(&state.board).expire_success(&cell, transition.generation);
                if expired {
                    state.view.render_indicator(&cell, SaveIndicator::Neutral);
                }
            });
        }
    }
}
