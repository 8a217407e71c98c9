// Fixed-row-height virtualizer: materializes the rows overlapping the viewport
// plus an optional overscan on either side.

use std::cell::Cell;
use std::rc::Rc;

use super::{VirtualRow, Virtualizer};
use crate::geometry::Rect;

/// A virtual list whose rows all share one height. Scroll state sits behind
/// `Cell`s so the host and the engine can share it through an `Rc`.
#[derive(Debug)]
pub struct UniformRows {
    /// `None` once the scroll container is unmounted.
    pub bounds: Cell<Option<Rect>>,
    pub scroll: Cell<f32>,
    pub row_height: f32,
    pub count: Cell<usize>,
    pub overscan: usize,
    /// Last index passed to `scroll_to_index`.
    pub scrolled_to: Cell<Option<usize>>,
}

impl UniformRows {
    pub fn new(bounds: Rect, row_height: f32, count: usize) -> Rc<Self> {
        Self::with_overscan(bounds, row_height, count, 0)
    }

    pub fn with_overscan(bounds: Rect, row_height: f32, count: usize, overscan: usize) -> Rc<Self> {
        Rc::new(Self {
            bounds: Cell::new(Some(bounds)),
            scroll: Cell::new(0.0),
            row_height,
            count: Cell::new(count),
            overscan,
            scrolled_to: Cell::new(None),
        })
    }

    fn max_scroll(&self) -> f32 {
        let content = self.count.get() as f32 * self.row_height;
        let viewport = self.bounds.get().map(|b| b.height).unwrap_or(0.0);
        (content - viewport).max(0.0)
    }

    /// Jump to `offset`, clamped to the content.
    pub fn set_scroll(&self, offset: f32) {
        self.scroll.set(offset.clamp(0.0, self.max_scroll()));
    }
}

impl Virtualizer for UniformRows {
    fn visible_rows(&self) -> Vec<VirtualRow> {
        let Some(bounds) = self.bounds.get() else {
            return Vec::new();
        };
        let count = self.count.get();
        if count == 0 || self.row_height <= 0.0 {
            return Vec::new();
        }
        let first = (self.scroll.get() / self.row_height).floor() as usize;
        let visible = (bounds.height / self.row_height).ceil() as usize + 1;
        let start = first.saturating_sub(self.overscan);
        let end = (first + visible + self.overscan).min(count);
        (start..end)
            .map(|i| VirtualRow::new(i, i as f32 * self.row_height, self.row_height))
            .collect()
    }

    fn scroll_offset(&self) -> f32 {
        self.scroll.get()
    }

    fn container_bounds(&self) -> Option<Rect> {
        self.bounds.get()
    }

    /// Records the request and brings the row into view.
    fn scroll_to_index(&self, index: usize) {
        self.scrolled_to.set(Some(index));
        let Some(bounds) = self.bounds.get() else {
            return;
        };
        let top = index as f32 * self.row_height;
        let scroll = self.scroll.get();
        if top < scroll {
            self.set_scroll(top);
        } else if top + self.row_height > scroll + bounds.height {
            self.set_scroll(top + self.row_height - bounds.height);
        }
    }

    fn scroll_by(&self, delta: f32) {
        self.set_scroll(self.scroll.get() + delta);
    }
}
