use serde::{Deserialize, Serialize};
use std::fmt;

use crate::field::{CellId, RowKey};

/// Form field carrying the action discriminator
pub const ACTION_FIELD: &str = "action";
/// Action value for a single-field grid save
pub const SAVE_GRID_ACTION: &str = "save_grid";
/// Form field carrying the forgery-protection token
pub const TOKEN_FIELD: &str = "csrfmiddlewaretoken";
/// Cookie holding the token when the page embeds none
pub const TOKEN_COOKIE: &str = "csrftoken";
/// Header repeating the token on every write
pub const TOKEN_HEADER: &str = "X-CSRFToken";
/// Path fragment of the forms whose submissions are intercepted
pub const STRUCTURAL_ACTION_PATH: &str = "timesheet_action";

/// Find a cookie in a `Cookie` header string and percent-decode its value
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        })
}

/// Per-session token the endpoint requires on state-changing requests
#[derive(Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn new(token: impl Into<String>) -> Self {
        CsrfToken(token.into())
    }

    /// Prefer the token embedded in the page; fall back to the cookie
    pub fn resolve(embedded: Option<&str>, cookie_header: Option<&str>) -> Option<Self> {
        embedded
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(CsrfToken::new)
            .or_else(|| {
                cookie_header
                    .and_then(|header| cookie_value(header, TOKEN_COOKIE))
                    .filter(|token| !token.is_empty())
                    .map(CsrfToken)
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CsrfToken(***)")
    }
}

/// Value of a form's `action` field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormAction {
    SaveGrid,
    AddRow,
    DeleteRow,
    Submit,
    Other(String),
}

impl FormAction {
    pub fn parse(value: &str) -> Self {
        match value {
            SAVE_GRID_ACTION => FormAction::SaveGrid,
            "add_row" => FormAction::AddRow,
            "delete_row" => FormAction::DeleteRow,
            "submit" => FormAction::Submit,
            other => FormAction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FormAction::SaveGrid => SAVE_GRID_ACTION,
            FormAction::AddRow => "add_row",
            FormAction::DeleteRow => "delete_row",
            FormAction::Submit => "submit",
            FormAction::Other(other) => other,
        }
    }
}

impl fmt::Display for FormAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One auto-save request body
#[derive(Debug, Clone)]
pub struct SavePayload {
    pub token: CsrfToken,
    pub field: CellId,
    /// Sent verbatim; empty asks the server to delete the slot's record
    pub value: String,
}

impl SavePayload {
    pub fn new(token: CsrfToken, field: CellId, value: impl Into<String>) -> Self {
        Self {
            token,
            field,
            value: value.into(),
        }
    }

    /// Form-encoded fields in submission order
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            (ACTION_FIELD.to_string(), SAVE_GRID_ACTION.to_string()),
            (TOKEN_FIELD.to_string(), self.token.as_str().to_string()),
            (self.field.field_name(), self.value.clone()),
        ]
    }
}

/// A page form that changes the grid's structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralForm {
    pub action_url: String,
    pub fields: Vec<(String, String)>,
}

impl StructuralForm {
    pub fn new(action_url: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            action_url: action_url.into(),
            fields,
        }
    }

    /// The form posted by the "add row" dialog
    pub fn add_row(action_url: impl Into<String>, key: RowKey, token: &CsrfToken) -> Self {
        let optional = |id: Option<u64>| id.map(|id| id.to_string()).unwrap_or_default();
        Self::new(
            action_url,
            vec![
                (TOKEN_FIELD.to_string(), token.as_str().to_string()),
                (ACTION_FIELD.to_string(), FormAction::AddRow.as_str().to_string()),
                ("project".to_string(), key.project.to_string()),
                ("task".to_string(), optional(key.task)),
                ("activity".to_string(), optional(key.activity)),
            ],
        )
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The form's action discriminator, if it has one
    pub fn action(&self) -> Option<FormAction> {
        self.field(ACTION_FIELD).map(FormAction::parse)
    }

    /// Whether submitting this form must wait for a flush of pending saves
    pub fn is_intercepted(&self) -> bool {
        self.action_url.contains(STRUCTURAL_ACTION_PATH)
            && self.action() == Some(FormAction::AddRow)
    }
}
