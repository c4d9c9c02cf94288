use std::sync::Arc;

use timegrid_core::{CellId, CsrfToken, SaveOutcome, SavePayload};

use crate::error::AutosaveError;
use crate::indicators::IndicatorState;
use crate::transport::{is_success_status, SaveTransport};

/// Persists one field value per request and reports the outcome on the cell
pub struct FieldSaveClient {
    transport: Arc<dyn SaveTransport>,
    endpoint: String,
    token: CsrfToken,
    indicators: Arc<IndicatorState>,
}

impl FieldSaveClient {
    pub fn new(
        transport: Arc<dyn SaveTransport>,
        endpoint: impl Into<String>,
        token: CsrfToken,
        indicators: Arc<IndicatorState>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            token,
            indicators,
        }
    }

    /// Save `raw` as the value of `cell`.
    ///
    /// An empty `raw` deletes the stored record. Never fails: transport
    /// errors and non-2xx responses resolve to [`SaveOutcome::Failure`].
    pub async fn save(&self, cell: &CellId, raw: &str) -> SaveOutcome {
        let outcome = match self.send(cell, raw).await {
            Ok(()) => {
                tracing::info!(%cell, value = raw, "Auto-saved");
                SaveOutcome::Success
            }
            Err(e) => {
                tracing::error!(%cell, "Auto-save failed: {}", e);
                SaveOutcome::Failure(e.to_string())
            }
        };

        self.indicators.record(cell, &outcome);
        outcome
    }

    async fn send(&self, cell: &CellId, raw: &str) -> Result<(), AutosaveError> {
        let payload = SavePayload::new(self.token.clone(), cell.clone(), raw);
        let status = self
            .transport
            .post_form(&self.endpoint, &payload.to_pairs())
            .await?;

        if is_success_status(status) {
            Ok(())
        } else {
            Err(AutosaveError::Status(status))
        }
    }
}
