// Drag session: everything frozen at drag start plus the live per-move state.

use serde::Serialize;

use super::dragset::DragSet;
use crate::model::{CollectionId, DragMode, Item, PanelId};
use crate::panel::collision::TargetKind;
use crate::panel::position::DropPosition;

/// Where a drag starts.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOrigin {
    /// A row of a registered panel, addressed by its visual index.
    Panel {
        panel: PanelId,
        visible_index: usize,
    },
    /// Items dragged from outside any panel (e.g. search results).
    External { items: Vec<Item> },
}

/// Source panel attributes, frozen at drag start.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceContext {
    pub panel: PanelId,
    pub collection: Option<CollectionId>,
    pub editable: bool,
    /// Panel default with the engine-wide default already applied.
    pub default_mode: DragMode,
}

/// Cross-panel "insert here" indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionMarker {
    pub panel: PanelId,
    pub visible_index: usize,
}

/// The single active drag.
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Composite key identifying the dragged row; unique across panels.
    pub drag_id: String,
    pub dragged: Item,
    /// `None` for external-origin drags.
    pub source: Option<SourceContext>,
    pub drag_set: DragSet,
    /// Size of the source selection at drag start (0 when nothing was selected).
    pub selection_count: usize,
    /// Source panel's ordered visible list at drag start.
    pub snapshot: Vec<Item>,
    pub target: Option<TargetKind>,
    pub drop_position: Option<DropPosition>,
    pub marker: Option<InsertionMarker>,
    pub live_mode: DragMode,
}

impl DragSession {
    pub fn new(
        dragged: Item,
        source: Option<SourceContext>,
        drag_set: DragSet,
        selection_count: usize,
        snapshot: Vec<Item>,
        visible_index: Option<usize>,
    ) -> Self {
        let drag_id = match (&source, visible_index) {
            (Some(src), Some(idx)) => format!("{}:{}:{}", src.panel, dragged.id, idx),
            _ => format!("external:{}", dragged.id),
        };
        let live_mode = source
            .as_ref()
            .map(|s| s.default_mode)
            .unwrap_or(DragMode::Copy);
        Self {
            drag_id,
            dragged,
            source,
            drag_set,
            selection_count,
            snapshot,
            target: None,
            drop_position: None,
            marker: None,
            live_mode,
        }
    }

    pub fn source_panel(&self) -> Option<&PanelId> {
        self.source.as_ref().map(|s| &s.panel)
    }

    pub fn target_panel(&self) -> Option<&PanelId> {
        self.target.as_ref().and_then(TargetKind::panel)
    }

    /// Read-only observables for UI feedback.
    pub fn view(&self) -> SessionView {
        SessionView {
            drag_id: self.drag_id.clone(),
            active_item: self.dragged.clone(),
            drag_count: self.drag_set.len(),
            source_panel: self.source_panel().cloned(),
            target_panel: self.target_panel().cloned(),
            insertion_index: self.drop_position.map(|p| p.visible_index),
            marker: self.marker.clone(),
            live_mode: self.live_mode,
        }
    }
}

/// Snapshot of the session as the UI sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub drag_id: String,
    pub active_item: Item,
    pub drag_count: usize,
    pub source_panel: Option<PanelId>,
    pub target_panel: Option<PanelId>,
    /// Insertion index in the target panel's visible list.
    pub insertion_index: Option<usize>,
    pub marker: Option<InsertionMarker>,
    pub live_mode: DragMode,
}
