use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::field::CellId;

/// Visual save state of a cell's input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveIndicator {
    #[default]
    Neutral,
    Success,
    Failure,
}

impl SaveIndicator {
    /// Validation class applied to the input element
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            SaveIndicator::Neutral => None,
            SaveIndicator::Success => Some("is-valid"),
            SaveIndicator::Failure => Some("is-invalid"),
        }
    }
}

/// Result of a single field save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveOutcome {
    Success,
    Failure(String),
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Success)
    }

    pub fn indicator(&self) -> SaveIndicator {
        match self {
            SaveOutcome::Success => SaveIndicator::Success,
            SaveOutcome::Failure(_) => SaveIndicator::Failure,
        }
    }
}

/// A state change on the board, stamped with the cell's generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: SaveIndicator,
    pub generation: u64,
    /// False when the cell already showed `state`
    pub changed: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    state: SaveIndicator,
    generation: u64,
}

/// Save indicators for every cell.
///
/// Each transition bumps the cell's generation. A delayed success revert
/// only applies if the generation it was issued for is still current, so a
/// newer edit or save always wins.
#[derive(Debug, Default)]
pub struct IndicatorBoard {
    slots: HashMap<CellId, Slot>,
}

impl IndicatorBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: &CellId) -> SaveIndicator {
        self.slots.get(cell).map(|slot| slot.state).unwrap_or_default()
    }

    fn transition(&mut self, cell: &CellId, state: SaveIndicator) -> Transition {
        let slot = self.slots.entry(cell.clone()).or_default();
        let changed = slot.state != state;
        slot.state = state;
        slot.generation += 1;
        Transition {
            state,
            generation: slot.generation,
            changed,
        }
    }

    /// The user edited the cell: clear any success/failure hint
    pub fn reset(&mut self, cell: &CellId) -> Transition {
        self.transition(cell, SaveIndicator::Neutral)
    }

    /// A save settled
    pub fn record(&mut self, cell: &CellId, outcome: &SaveOutcome) -> Transition {
        self.transition(cell, outcome.indicator())
    }

    /// Revert a displayed success back to neutral, unless superseded
    pub fn expire_success(&mut self, cell: &CellId, generation: u64) -> bool {
        match self.slots.get_mut(cell) {
            Some(slot) if slot.generation == generation && slot.state == SaveIndicator::Success => {
                slot.state = SaveIndicator::Neutral;
                true
            }
            _ => false,
        }
    }
}
