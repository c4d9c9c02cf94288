use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::grid::Grid;

/// Render hours with exactly one decimal place
pub fn format_hours(hours: Decimal) -> String {
    let rounded = hours.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.1}", rounded)
}

/// Derived row, column and grand totals of a grid.
///
/// Never stored: recomputed in full from the current cell values. Sums are
/// exact decimals, so the grand total is the same whether it is added up by
/// rows or by columns. Sums saturate at `Decimal::MAX` instead of overflowing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub row_totals: Vec<Decimal>,
    pub column_totals: Vec<Decimal>,
    pub grand_total: Decimal,
}

impl Totals {
    pub fn compute(grid: &Grid) -> Self {
        let mut column_totals = vec![Decimal::ZERO; grid.num_days()];
        let mut row_totals = Vec::with_capacity(grid.rows().len());

        for row in grid.rows() {
            let mut row_total = Decimal::ZERO;
            for (col, cell) in row.cells().iter().enumerate() {
                let hours = cell.hours();
                row_total = row_total.saturating_add(hours);
                if let Some(total) = column_totals.get_mut(col) {
                    *total = total.saturating_add(hours);
                }
            }
            row_totals.push(row_total);
        }

        let grand_total = saturating_sum(&row_totals);

        Self {
            row_totals,
            column_totals,
            grand_total,
        }
    }

    /// The grand total added up from the day columns
    pub fn grand_total_by_columns(&self) -> Decimal {
        saturating_sum(&self.column_totals)
    }

    /// Formatted strings for the presentation layer
    pub fn view(&self) -> TotalsView {
        let grand_total = format_hours(self.grand_total);
        TotalsView {
            row_totals: self.row_totals.iter().copied().map(format_hours).collect(),
            column_totals: self.column_totals.iter().copied().map(format_hours).collect(),
            total_hours: grand_total.clone(),
            grand_total,
        }
    }
}

fn saturating_sum(values: &[Decimal]) -> Decimal {
    values
        .iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(*value))
}

/// Totals as displayed. `total_hours` is mirrored into the grid container's
/// `totalHours` attribute for the submission guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsView {
    pub row_totals: Vec<String>,
    pub column_totals: Vec<String>,
    pub grand_total: String,
    pub total_hours: String,
}
