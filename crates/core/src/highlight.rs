//! Expression listing and the single active highlight.
//!
//! Selecting a listing entry clears every mark, then, unless that entry was
//! the one already marked, marks it and all cells of its expression. At most
//! one entry is ever active.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::ExpressionIndex;
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub expression: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Highlight {
    entries: Vec<ListingEntry>,
}

impl Highlight {
    /// Replace the listing with the submitted expressions, all unmarked.
    pub fn set_listing<I, S>(&mut self, expressions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries = expressions
            .into_iter()
            .map(|e| ListingEntry {
                expression: e.into(),
                highlighted: false,
            })
            .collect();
    }

    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    pub fn active(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.highlighted)
    }

    /// Toggle entry `entry`. Returns whether it is highlighted afterwards.
    pub fn toggle(&mut self, entry: usize, scene: &mut Scene, index: &ExpressionIndex) -> bool {
        let Some(was_active) = self.entries.get(entry).map(|e| e.highlighted) else {
            debug!(entry, listed = self.entries.len(), "Highlight toggle outside listing");
            return false;
        };

        self.clear(scene);
        if was_active {
            return false;
        }

        let target = &mut self.entries[entry];
        target.highlighted = true;
        for &id in index.cells_for(&target.expression) {
            scene.set_highlighted(id, true);
        }
        true
    }

    /// Drop every mark, on entries and cells alike.
    pub fn clear(&mut self, scene: &mut Scene) {
        for entry in &mut self.entries {
            entry.highlighted = false;
        }
        scene.clear_highlights();
    }
}
