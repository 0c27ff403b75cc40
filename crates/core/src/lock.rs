//! Detail panel content and the click-to-freeze lock that gates it.

use serde::{Deserialize, Serialize};

use crate::record::CellRecord;
use crate::scene::ElementId;

pub const DETAIL_PLACEHOLDER: &str = "Hover cell for details";

/// Whether hover updates the detail panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailLock {
    #[default]
    Unfrozen,
    Frozen(ElementId),
}

/// Result of a click on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    /// `cell` is now frozen; `released` lost the indicator, if any.
    Froze {
        cell: ElementId,
        released: Option<ElementId>,
    },
    /// The frozen cell was clicked again.
    Thawed { released: ElementId },
}

impl DetailLock {
    pub fn is_frozen(&self) -> bool {
        matches!(self, DetailLock::Frozen(_))
    }

    pub fn frozen(&self) -> Option<ElementId> {
        match self {
            DetailLock::Frozen(id) => Some(*id),
            DetailLock::Unfrozen => None,
        }
    }

    /// Hover only reaches the panel while nothing is frozen.
    pub fn accepts_hover(&self) -> bool {
        !self.is_frozen()
    }

    pub fn click(&mut self, cell: ElementId) -> LockTransition {
        match *self {
            DetailLock::Frozen(current) if current == cell => {
                *self = DetailLock::Unfrozen;
                LockTransition::Thawed { released: cell }
            }
            previous => {
                *self = DetailLock::Frozen(cell);
                LockTransition::Froze {
                    cell,
                    released: previous.frozen(),
                }
            }
        }
    }

    /// Force `Unfrozen`, returning the cell that was frozen.
    pub fn reset(&mut self) -> Option<ElementId> {
        std::mem::take(self).frozen()
    }
}

/// What the detail panel shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailPanel {
    #[default]
    Placeholder,
    Cell {
        /// `"2 events at 00:01:"`
        header: String,
        expressions: Vec<String>,
    },
}

impl DetailPanel {
    pub fn for_record(record: &CellRecord) -> Self {
        DetailPanel::Cell {
            header: format!("{}:", record.headline()),
            expressions: record.expressions.clone(),
        }
    }

    pub fn header(&self) -> &str {
        match self {
            DetailPanel::Placeholder => DETAIL_PLACEHOLDER,
            DetailPanel::Cell { header, .. } => header,
        }
    }
}
