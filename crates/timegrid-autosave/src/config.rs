use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use timegrid_core::CsrfToken;

use crate::error::AutosaveError;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/timesheet/timesheet_action/";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_SUCCESS_DISPLAY_MS: u64 = 2000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL the grid form and the structural forms post to
    pub endpoint: String,
    /// Token embedded in the page, if any
    pub csrf_token: Option<String>,
    /// Session `Cookie` header; also the token fallback
    pub cookie: Option<String>,
    pub debounce_ms: u64,
    pub success_display_ms: u64,
    pub request_timeout_secs: u64,
    /// Grid description replayed by the binary
    pub grid_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint =
            lookup("TIMEGRID_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let csrf_token = lookup("TIMEGRID_CSRF_TOKEN").filter(|v| !v.is_empty());
        let cookie = lookup("TIMEGRID_COOKIE").filter(|v| !v.is_empty());
        let debounce_ms = parse_or(&lookup, "TIMEGRID_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?;
        let success_display_ms = parse_or(
            &lookup,
            "TIMEGRID_SUCCESS_DISPLAY_MS",
            DEFAULT_SUCCESS_DISPLAY_MS,
        )?;
        let request_timeout_secs = parse_or(
            &lookup,
            "TIMEGRID_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let grid_file = lookup("TIMEGRID_GRID_FILE").map(PathBuf::from);

        Ok(Self {
            endpoint,
            csrf_token,
            cookie,
            debounce_ms,
            success_display_ms,
            request_timeout_secs,
            grid_file,
        })
    }

    /// The token to send, embedded value first, cookie second
    pub fn token(&self) -> Option<CsrfToken> {
        CsrfToken::resolve(self.csrf_token.as_deref(), self.cookie.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Settings for a [`TimesheetEditor`](crate::TimesheetEditor)
    pub fn engine(&self) -> Result<EngineConfig, AutosaveError> {
        let token = self.token().ok_or(AutosaveError::MissingToken)?;
        Ok(EngineConfig {
            endpoint: self.endpoint.clone(),
            token,
            debounce: Duration::from_millis(self.debounce_ms),
            success_display: Duration::from_millis(self.success_display_ms),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", key, e)),
        None => Ok(default),
    }
}

/// Runtime settings of one editor instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub endpoint: String,
    pub token: CsrfToken,
    /// Quiet period before an edited cell is saved
    pub debounce: Duration,
    /// How long a success hint stays visible
    pub success_display: Duration,
}

impl EngineConfig {
    pub fn new(endpoint: impl Into<String>, token: CsrfToken) -> Self {
        Self {
            endpoint: endpoint.into(),
            token,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            success_display: Duration::from_millis(DEFAULT_SUCCESS_DISPLAY_MS),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_success_display(mut self, success_display: Duration) -> Self {
        self.success_display = success_display;
        self
    }
}
