use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GridError;

const FIELD_PREFIX: &str = "hours";
const NONE_SEGMENT: &str = "None";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// The project/task/activity combination a grid row books hours against
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RowKey {
    pub project: u64,
    pub task: Option<u64>,
    pub activity: Option<u64>,
}

impl RowKey {
    pub const fn new(project: u64, task: Option<u64>, activity: Option<u64>) -> Self {
        RowKey {
            project,
            task,
            activity,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.project,
            OptionalId(self.task),
            OptionalId(self.activity)
        )
    }
}

struct OptionalId(Option<u64>);

impl fmt::Display for OptionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{}", id),
            None => f.write_str(NONE_SEGMENT),
        }
    }
}

/// Parse a task/activity segment; the server writes missing ids as `None`
pub fn parse_optional_id(segment: &str) -> Option<Option<u64>> {
    match segment {
        "" | NONE_SEGMENT => Some(None),
        s => s.parse().ok().map(Some),
    }
}

/// Stable identity of one grid cell.
///
/// Renders as the input's form field name, `hours_{project}_{task}_{activity}_{date}`,
/// which is also the key the persistence endpoint stores the value under.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellId {
    row: RowKey,
    date: NaiveDate,
}

impl CellId {
    pub const fn new(row: RowKey, date: NaiveDate) -> Self {
        CellId { row, date }
    }

    pub fn row(&self) -> RowKey {
        self.row
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The form field name carrying this cell's value
    pub fn field_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            FIELD_PREFIX,
            self.row,
            self.date.format(DATE_FORMAT)
        )
    }
}

impl FromStr for CellId {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || GridError::MalformedField(s.to_string());

        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() != 5 || parts[0] != FIELD_PREFIX {
            return Err(malformed());
        }

        let project = parts[1].parse().map_err(|_| malformed())?;
        let task = parse_optional_id(parts[2]).ok_or_else(malformed)?;
        let activity = parse_optional_id(parts[3]).ok_or_else(malformed)?;
        let date = NaiveDate::parse_from_str(parts[4], DATE_FORMAT)
            .map_err(|_| GridError::InvalidDate(parts[4].to_string()))?;

        Ok(CellId::new(RowKey::new(project, task, activity), date))
    }
}

impl TryFrom<String> for CellId {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellId> for String {
    fn from(id: CellId) -> Self {
        id.to_string()
    }
}
