pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod flush;
pub mod indicators;
pub mod replay;
pub mod scheduler;
pub mod transport;
pub mod view;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use client::FieldSaveClient;
pub use config::{Config, EngineConfig};
pub use editor::TimesheetEditor;
pub use error::AutosaveError;
pub use flush::{FlushCoordinator, FlushReport};
pub use indicators::IndicatorState;
pub use replay::{run_replay, ReplayCommand};
pub use scheduler::DebounceScheduler;
pub use transport::{is_success_status, HttpTransport, SaveTransport};
pub use view::{GridView, MemoryView, TracingView};

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
