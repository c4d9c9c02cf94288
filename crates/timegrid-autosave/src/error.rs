use thiserror::Error;
use timegrid_core::GridError;

/// Errors raised inside the auto-save engine.
///
/// Field saves never return these to callers; they are folded into a
/// `SaveOutcome::Failure` carrying the message.
#[derive(Error, Debug)]
pub enum AutosaveError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint responded with status {0}")]
    Status(u16),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing forgery-protection token")]
    MissingToken,

    #[error("Save task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid replay command: {0}")]
    Replay(String),
}
