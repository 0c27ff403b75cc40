//! The abstract rendered set: one element per drawn cell, keyed by label.
//!
//! Reconciliation is a keyed join against [`CellRecord::key`]. Matching
//! elements keep their identity and get a new fill, records without an
//! element enter at their grid position, elements without a record exit.
//! Nothing here knows how elements are painted; front-ends read the scene.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{CellRecord, HOURS_PER_DAY, MINUTES_PER_HOUR};
use crate::scale::{ColorScale, Rgb};

pub const CELL_SIZE: f64 = 18.0;
pub const BAND_PADDING: f64 = 0.05;

/// Identity of a rendered element. Never reused within one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

// ── Geometry ────────────────────────────────────────────────────────

/// Evenly spaced bands over `[0, extent]` with equal inner and outer padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandScale {
    bands: usize,
    step: f64,
    start: f64,
    padding: f64,
}

impl BandScale {
    pub fn new(bands: usize, extent: f64, padding: f64) -> Self {
        let n = bands as f64;
        let step = extent / (n - padding + padding * 2.0).max(1.0);
        let start = (extent - step * (n - padding)) * 0.5;
        Self {
            bands,
            step,
            start,
            padding,
        }
    }

    /// Offset of band `index`, or `None` outside the domain.
    pub fn position(&self, index: usize) -> Option<f64> {
        (index < self.bands).then(|| self.start + self.step * index as f64)
    }

    pub fn bandwidth(&self) -> f64 {
        self.step * (1.0 - self.padding)
    }
}

/// Minutes across, hours down, hour 0 on top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub x: BandScale,
    pub y: BandScale,
}

impl Default for GridGeometry {
    fn default() -> Self {
        let minutes = MINUTES_PER_HOUR as usize;
        let hours = HOURS_PER_DAY as usize;
        Self {
            x: BandScale::new(minutes, CELL_SIZE * minutes as f64, BAND_PADDING),
            y: BandScale::new(hours, CELL_SIZE * hours as f64, BAND_PADDING),
        }
    }
}

// ── Elements ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellElement {
    pub id: ElementId,
    pub record: CellRecord,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Rgb,
    /// Member of the active expression highlight.
    pub highlighted: bool,
    /// Carries the detail lock indicator.
    pub locked: bool,
}

/// What a reconciliation did, by element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub entered: Vec<ElementId>,
    pub updated: Vec<ElementId>,
    pub exited: Vec<ElementId>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    cells: IndexMap<String, CellElement>,
    next_id: u64,
    geometry: GridGeometry,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join `records` (in draw order) against the current elements by key.
    pub fn reconcile(&mut self, records: Vec<CellRecord>, scale: &ColorScale) -> Reconciliation {
        let mut outcome = Reconciliation::default();
        let incoming: HashSet<&str> = records.iter().map(|r| r.key.as_str()).collect();

        self.cells.retain(|key, element| {
            let keep = incoming.contains(key.as_str());
            if !keep {
                outcome.exited.push(element.id);
            }
            keep
        });

        let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.key.clone()) {
                debug!(key = %record.key, "Ignoring duplicate cell key");
                continue;
            }
            let fill = scale.color(record.count);
            match self.cells.get_mut(&record.key) {
                Some(element) => {
                    element.fill = fill;
                    element.record = record;
                    outcome.updated.push(element.id);
                }
                None => {
                    let element = self.create(record, fill);
                    outcome.entered.push(element.id);
                    self.cells.insert(element.record.key.clone(), element);
                }
            }
        }

        outcome
    }

    fn create(&mut self, record: CellRecord, fill: Rgb) -> CellElement {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        let x = self.geometry.x.position(record.minute as usize).unwrap_or(0.0);
        let y = self.geometry.y.position(record.hour as usize).unwrap_or(0.0);
        CellElement {
            id,
            record,
            x,
            y,
            width: self.geometry.x.bandwidth(),
            height: self.geometry.y.bandwidth(),
            fill,
            highlighted: false,
            locked: false,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Elements in document order: survivors first, then entered ones.
    pub fn iter(&self) -> impl Iterator<Item = &CellElement> {
        self.cells.values()
    }

    pub fn get(&self, key: &str) -> Option<&CellElement> {
        self.cells.get(key)
    }

    pub fn id_of(&self, key: &str) -> Option<ElementId> {
        self.cells.get(key).map(|e| e.id)
    }

    pub fn element(&self, id: ElementId) -> Option<&CellElement> {
        self.cells.values().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut CellElement> {
        self.cells.values_mut().find(|e| e.id == id)
    }

    pub fn at(&self, hour: u8, minute: u8) -> Option<&CellElement> {
        self.cells
            .values()
            .find(|e| e.record.hour == hour && e.record.minute == minute)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.element(id).is_some()
    }

    /// Set the lock indicator; returns `false` if the element is gone.
    pub fn set_locked(&mut self, id: ElementId, locked: bool) -> bool {
        match self.element_mut(id) {
            Some(element) => {
                element.locked = locked;
                true
            }
            None => false,
        }
    }

    pub fn set_highlighted(&mut self, id: ElementId, highlighted: bool) -> bool {
        match self.element_mut(id) {
            Some(element) => {
                element.highlighted = highlighted;
                true
            }
            None => false,
        }
    }

    pub fn clear_highlights(&mut self) {
        for element in self.cells.values_mut() {
            element.highlighted = false;
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hour: u8, minute: u8, count: u32) -> CellRecord {
        CellRecord {
            key: format!("{:02}:{:02}", hour, minute),
            hour,
            minute,
            count,
            expressions: vec!["x".to_string()],
        }
    }

    fn ordinal(records: &[CellRecord]) -> ColorScale {
        ColorScale::select(records)
    }

    #[test]
    fn band_scale_matches_padded_layout() {
        let band = BandScale::new(60, 1080.0, 0.05);
        let first = band.position(0).unwrap();
        let second = band.position(1).unwrap();
        assert!((second - first - 1080.0 / 60.05).abs() < 1e-9);
        assert!(band.bandwidth() < second - first);
        assert!(band.position(60).is_none());
        let last = band.position(59).unwrap();
        assert!(last + band.bandwidth() <= 1080.0 + 1e-9);
    }

    #[test]
    fn hour_zero_is_on_top() {
        let geometry = GridGeometry::default();
        assert!(geometry.y.position(0).unwrap() < geometry.y.position(23).unwrap());
    }

    #[test]
    fn enter_update_exit() {
        let mut scene = Scene::new();
        let first = vec![record(0, 0, 1), record(0, 1, 2)];
        let scale = ordinal(&first);
        let outcome = scene.reconcile(first, &scale);
        assert_eq!(outcome.entered.len(), 2);
        assert!(outcome.updated.is_empty() && outcome.exited.is_empty());
        let kept_id = scene.id_of("00:01").unwrap();
        let gone_id = scene.id_of("00:00").unwrap();

        let second = vec![record(0, 1, 5), record(1, 0, 1)];
        let scale = ordinal(&second);
        let outcome = scene.reconcile(second, &scale);
        assert_eq!(outcome.updated, vec![kept_id]);
        assert_eq!(outcome.exited, vec![gone_id]);
        assert_eq!(outcome.entered.len(), 1);
        assert_eq!(scene.len(), 2);

        let kept = scene.get("00:01").unwrap();
        assert_eq!(kept.id, kept_id);
        assert_eq!(kept.record.count, 5);
        assert_eq!(kept.fill, scale.color(5));
        assert!(!scene.contains(gone_id));
    }

    #[test]
    fn ids_are_not_reused() {
        let mut scene = Scene::new();
        let scale = ordinal(&[]);
        scene.reconcile(vec![record(0, 0, 1)], &scale);
        let old = scene.id_of("00:00").unwrap();
        scene.reconcile(vec![], &scale);
        scene.reconcile(vec![record(0, 0, 1)], &scale);
        assert_ne!(scene.id_of("00:00").unwrap(), old);
    }

    #[test]
    fn empty_reconcile_clears_everything() {
        let mut scene = Scene::new();
        let records = vec![record(3, 4, 1), record(5, 6, 1)];
        let scale = ordinal(&records);
        scene.reconcile(records, &scale);
        let outcome = scene.reconcile(Vec::new(), &scale);
        assert_eq!(outcome.exited.len(), 2);
        assert!(scene.is_empty());
    }

    #[test]
    fn entered_elements_are_positioned_on_grid() {
        let mut scene = Scene::new();
        let records = vec![record(2, 30, 1)];
        let scale = ordinal(&records);
        scene.reconcile(records, &scale);
        let element = scene.at(2, 30).unwrap();
        let geometry = scene.geometry();
        assert_eq!(element.x, geometry.x.position(30).unwrap());
        assert_eq!(element.y, geometry.y.position(2).unwrap());
        assert_eq!(element.width, geometry.x.bandwidth());
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let mut scene = Scene::new();
        let records = vec![record(0, 0, 2), record(0, 0, 1)];
        let scale = ordinal(&records);
        let outcome = scene.reconcile(records, &scale);
        assert_eq!(outcome.entered.len(), 1);
        assert_eq!(scene.get("00:00").unwrap().record.count, 2);
    }
}
