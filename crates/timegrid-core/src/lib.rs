pub mod cell;
pub mod error;
pub mod field;
pub mod form;
pub mod grid;
pub mod indicator;
pub mod totals;

pub use cell::{Cell, HourValue};
pub use error::GridError;
pub use field::{CellId, RowKey};
pub use form::{
    cookie_value, CsrfToken, FormAction, SavePayload, StructuralForm, ACTION_FIELD,
    SAVE_GRID_ACTION, STRUCTURAL_ACTION_PATH, TOKEN_COOKIE, TOKEN_FIELD, TOKEN_HEADER,
};
pub use grid::{num_days_from_attr, Grid, GridDescription, Row, RowDescription, DEFAULT_NUM_DAYS};
pub use indicator::{IndicatorBoard, SaveIndicator, SaveOutcome, Transition};
pub use totals::{format_hours, Totals, TotalsView};
