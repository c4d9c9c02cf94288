use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parsed content of an hours input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum HourValue {
    /// No entry. Saving it deletes the stored record for the slot.
    #[default]
    Empty,
    Hours(Decimal),
    /// Input that is not a non-negative decimal; counts as zero
    Invalid,
}

impl HourValue {
    /// Parse raw input text. Accepts a decimal comma, never fails.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return HourValue::Empty;
        }

        let normalized = trimmed.replace(',', ".");
        let parsed = Decimal::from_str(&normalized)
            .or_else(|_| Decimal::from_scientific(&normalized));

        match parsed {
            Ok(hours) if !hours.is_sign_negative() || hours.is_zero() => {
                HourValue::Hours(hours.abs())
            }
            _ => HourValue::Invalid,
        }
    }

    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, HourValue::Empty)
    }

    /// Hours contributed to totals (0 for empty or invalid input)
    pub fn hours(&self) -> Decimal {
        match self {
            HourValue::Hours(h) => *h,
            _ => Decimal::ZERO,
        }
    }

    /// Whether the value holds new data worth saving before navigation
    pub fn is_positive(&self) -> bool {
        matches!(self, HourValue::Hours(h) if *h > Decimal::ZERO)
    }
}

/// One grid cell: the raw text of its numeric input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    raw: String,
}

impl Cell {
    pub fn new(raw: impl Into<String>) -> Self {
        Cell { raw: raw.into() }
    }

    /// The input text exactly as entered; this is what gets saved
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn set_raw(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    pub fn value(&self) -> HourValue {
        HourValue::parse(&self.raw)
    }

    pub fn hours(&self) -> Decimal {
        self.value().hours()
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }
}
