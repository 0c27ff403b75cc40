//! Expression → cell elements, for highlighting.

use std::collections::HashMap;

use crate::scene::{ElementId, Scene};

/// Which rendered cells each expression contributes to.
///
/// Rebuilt from scratch after every draw; never patched.
#[derive(Debug, Clone, Default)]
pub struct ExpressionIndex {
    cells: HashMap<String, Vec<ElementId>>,
}

impl ExpressionIndex {
    pub fn build(scene: &Scene) -> Self {
        let mut cells: HashMap<String, Vec<ElementId>> = HashMap::new();
        for element in scene.iter() {
            for expression in &element.record.expressions {
                let ids = cells.entry(expression.clone()).or_default();
                // An expression listed twice in one record still marks the cell once.
                if ids.last() != Some(&element.id) {
                    ids.push(element.id);
                }
            }
        }
        Self { cells }
    }

    /// Cells of `expression` in scene order, empty if it fired nowhere.
    pub fn cells_for(&self, expression: &str) -> &[ElementId] {
        self.cells.get(expression).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
