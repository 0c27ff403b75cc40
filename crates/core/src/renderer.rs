//! All render state for one page session, in one place.
//!
//! [`Renderer::draw`] replaces the data-set: it sorts, picks the scale,
//! resets the lock and highlight, reconciles the scene, rebuilds the
//! expression index and recomputes the summary. The interaction methods
//! (hover, click, highlight, zone switch) then work on that data-set without
//! re-fetching.

use chrono_tz::Tz;
use tracing::debug;

use crate::axis::{AxisFormatter, AxisLabels};
use crate::error::Result;
use crate::highlight::{Highlight, ListingEntry};
use crate::index::ExpressionIndex;
use crate::lock::{DetailLock, DetailPanel, LockTransition};
use crate::record::CellRecord;
use crate::scale::{ColorScale, ScaleKind};
use crate::scene::{ElementId, Reconciliation, Scene};
use crate::summary::{summarize, SummaryLine};

/// Outcome of one draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawReport {
    pub reconciliation: Reconciliation,
    pub cells: usize,
    pub scale: ScaleKind,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    scene: Scene,
    scale: ColorScale,
    index: ExpressionIndex,
    summary: Vec<SummaryLine>,
    highlight: Highlight,
    lock: DetailLock,
    hovered: Option<ElementId>,
    detail: DetailPanel,
    axes: AxisFormatter,
    axis_labels: AxisLabels,
}

impl Renderer {
    /// Empty renderer labelling axes in `zone`, relative to today.
    pub fn new(zone: Tz) -> Self {
        let axes = AxisFormatter::for_date_text("today", zone);
        let axis_labels = axes.labels();
        Self {
            scene: Scene::new(),
            scale: ColorScale::select(&[]),
            index: ExpressionIndex::default(),
            summary: Vec::new(),
            highlight: Highlight::default(),
            lock: DetailLock::default(),
            hovered: None,
            detail: DetailPanel::default(),
            axes,
            axis_labels,
        }
    }

    /// Replace the drawn data-set. An empty `records` clears the grid.
    pub fn draw(&mut self, mut records: Vec<CellRecord>) -> Result<DrawReport> {
        records.sort_by(|a, b| b.count.cmp(&a.count));

        // Computed up front so a failure leaves the previous view intact.
        let summary = summarize(&records)?;
        let scale = ColorScale::select(&records);

        self.unfreeze();
        self.highlight.clear(&mut self.scene);
        self.hovered = None;
        self.detail = DetailPanel::Placeholder;

        let reconciliation = self.scene.reconcile(records, &scale);
        self.index = ExpressionIndex::build(&self.scene);
        self.summary = summary;
        self.scale = scale;

        debug!(
            entered = reconciliation.entered.len(),
            updated = reconciliation.updated.len(),
            exited = reconciliation.exited.len(),
            scale = ?self.scale.kind(),
            "Drew heat map"
        );

        Ok(DrawReport {
            cells: self.scene.len(),
            scale: self.scale.kind(),
            reconciliation,
        })
    }

    // ── Detail panel ────────────────────────────────────────────────

    /// Pointer entered `cell`. Returns whether the panel changed.
    pub fn hover(&mut self, cell: ElementId) -> bool {
        let Some(element) = self.scene.element(cell) else {
            return false;
        };
        self.hovered = Some(cell);
        if !self.lock.accepts_hover() {
            return false;
        }
        self.detail = DetailPanel::for_record(&element.record);
        true
    }

    /// Pointer left `cell`. The panel keeps showing the last subject.
    pub fn leave(&mut self, cell: ElementId) {
        if self.hovered == Some(cell) {
            self.hovered = None;
        }
    }

    /// Click on `cell`: freeze it, or thaw it if it is the frozen one.
    pub fn click(&mut self, cell: ElementId) -> Option<LockTransition> {
        if !self.scene.contains(cell) {
            return None;
        }
        // Clicking implies the pointer is over the cell.
        self.hovered = Some(cell);

        let transition = self.lock.click(cell);
        match transition {
            LockTransition::Froze { cell, released } => {
                if let Some(previous) = released {
                    self.scene.set_locked(previous, false);
                }
                self.scene.set_locked(cell, true);
            }
            LockTransition::Thawed { released } => {
                self.scene.set_locked(released, false);
            }
        }
        self.refresh_detail();
        Some(transition)
    }

    /// Force the lock open and drop its indicator.
    pub fn unfreeze(&mut self) {
        if let Some(previous) = self.lock.reset() {
            self.scene.set_locked(previous, false);
            self.refresh_detail();
        }
    }

    fn refresh_detail(&mut self) {
        let subject = self.lock.frozen().or(self.hovered);
        self.detail = subject
            .and_then(|id| self.scene.element(id))
            .map(|element| DetailPanel::for_record(&element.record))
            .unwrap_or_default();
    }

    // ── Highlight ───────────────────────────────────────────────────

    pub fn set_listing<I, S>(&mut self, expressions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight.clear(&mut self.scene);
        self.highlight.set_listing(expressions);
    }

    /// Toggle the highlight of listing entry `entry`.
    pub fn toggle_highlight(&mut self, entry: usize) -> bool {
        self.highlight.toggle(entry, &mut self.scene, &self.index)
    }

    pub fn clear_highlight(&mut self) {
        self.highlight.clear(&mut self.scene);
    }

    // ── Axes ────────────────────────────────────────────────────────

    /// Relabel both axes for `zone`. Cells are untouched.
    pub fn set_time_zone(&mut self, zone: Tz) {
        self.axes = self.axes.with_zone(zone);
        self.axis_labels = self.axes.labels();
    }

    /// Relabel both axes relative to the date typed into the form.
    pub fn set_reference_date(&mut self, text: &str) {
        self.axes = AxisFormatter::for_date_text(text, self.axes.zone());
        self.axis_labels = self.axes.labels();
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    pub fn index(&self) -> &ExpressionIndex {
        &self.index
    }

    pub fn summary(&self) -> &[SummaryLine] {
        &self.summary
    }

    pub fn listing(&self) -> &[ListingEntry] {
        self.highlight.entries()
    }

    pub fn active_highlight(&self) -> Option<usize> {
        self.highlight.active()
    }

    pub fn lock(&self) -> DetailLock {
        self.lock
    }

    pub fn hovered(&self) -> Option<ElementId> {
        self.hovered
    }

    pub fn detail(&self) -> &DetailPanel {
        &self.detail
    }

    pub fn axes(&self) -> &AxisFormatter {
        &self.axes
    }

    pub fn axis_labels(&self) -> &AxisLabels {
        &self.axis_labels
    }
}
