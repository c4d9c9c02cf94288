use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;

use timegrid_core::{CellId, Grid, SaveOutcome, StructuralForm};

use crate::client::FieldSaveClient;
use crate::error::AutosaveError;
use crate::scheduler::DebounceScheduler;
use crate::transport::{is_success_status, SaveTransport};

/// What happened to a structural submission
#[derive(Debug)]
pub struct FlushReport {
    /// Whether the submission waited for a flush
    pub intercepted: bool,
    /// Cells saved by the flush, in completion order of their tasks
    pub flushed: Vec<(CellId, SaveOutcome)>,
    /// Status of the re-issued submission
    pub submission: Result<u16, AutosaveError>,
}

impl FlushReport {
    pub fn submitted(&self) -> bool {
        self.submission.is_ok()
    }
}

/// Holds back a structural submission until every cell with new data has been saved
pub struct FlushCoordinator {
    grid: Arc<RwLock<Grid>>,
    scheduler: Arc<DebounceScheduler>,
    client: Arc<FieldSaveClient>,
    transport: Arc<dyn SaveTransport>,
}

impl FlushCoordinator {
    pub fn new(
        grid: Arc<RwLock<Grid>>,
        scheduler: Arc<DebounceScheduler>,
        client: Arc<FieldSaveClient>,
        transport: Arc<dyn SaveTransport>,
    ) -> Self {
        Self {
            grid,
            scheduler,
            client,
            transport,
        }
    }

    /// Save every positive cell concurrently, wait for all of them to
    /// settle, then submit `form`. Failed saves do not block the submission.
    pub async fn flush_then_submit(&self, form: &StructuralForm) -> FlushReport {
        tracing::info!(url = %form.action_url, "Saving all fields before structural submit");

        let candidates = self.grid.read().await.flush_candidates();
        let tasks: Vec<_> = candidates
            .into_iter()
            .map(|(cell, raw)| {
                self.scheduler.cancel(&cell);
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    let outcome = client.save(&cell, &raw).await;
                    (cell, outcome)
                })
            })
            .collect();

        let mut flushed = Vec::with_capacity(tasks.len());
        for result in join_all(tasks).await {
            match result {
                Ok(saved) => flushed.push(saved),
                Err(e) => {
                    let error = AutosaveError::from(e);
                    tracing::error!("Error saving fields: {}", error);
                }
            }
        }

        let failures = flushed
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .count();
        tracing::info!(
            saved = flushed.len() - failures,
            failed = failures,
            "All fields saved, submitting form"
        );

        FlushReport {
            intercepted: true,
            flushed,
            submission: self.submit(form).await,
        }
    }

    /// Post a form as-is
    pub async fn submit(&self, form: &StructuralForm) -> Result<u16, AutosaveError> {
        let status = self
            .transport
            .post_form(&form.action_url, &form.fields)
            .await
            .map_err(|e| {
                tracing::error!(url = %form.action_url, "Form submission failed: {}", e);
                e
            })?;

        if is_success_status(status) {
            Ok(status)
        } else {
            tracing::warn!(url = %form.action_url, status, "Form submission rejected");
            Err(AutosaveError::Status(status))
        }
    }
}
