// Drag-set resolution: does a gesture carry one item or the whole selection?

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{Item, ItemRef, SelectionKey};

/// The items a gesture carries, frozen at drag start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragSet {
    items: Vec<Item>,
    /// Visual index of each item in the source panel at drag start. Empty for
    /// drags that originate outside any panel.
    visual_indices: Vec<usize>,
}

impl DragSet {
    /// A single dragged item.
    pub fn single(item: Item, visual_index: usize) -> Self {
        Self {
            items: vec![item],
            visual_indices: vec![visual_index],
        }
    }

    /// Items supplied by a non-panel origin (e.g. search results).
    pub fn external(items: Vec<Item>) -> Self {
        Self {
            items,
            visual_indices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn visual_indices(&self) -> &[usize] {
        &self.visual_indices
    }

    pub fn refs(&self) -> Vec<ItemRef> {
        self.items.iter().map(Item::to_ref).collect()
    }

    /// Collection positions of the carried items.
    pub fn positions(&self) -> HashSet<usize> {
        self.items.iter().map(|i| i.position).collect()
    }

    pub fn min_position(&self) -> Option<usize> {
        self.items.iter().map(|i| i.position).min()
    }

    /// Whether the carried positions form one gap-free run in the collection.
    pub fn is_contiguous(&self) -> bool {
        let mut positions: Vec<usize> = self.items.iter().map(|i| i.position).collect();
        positions.sort_unstable();
        positions.dedup();
        if positions.len() != self.items.len() {
            return false;
        }
        positions.windows(2).all(|w| w[1] == w[0] + 1)
    }
}

/// Decide what a drag starting on `dragged` carries.
///
/// If the dragged item's selection key is part of a non-empty selection, the
/// whole selection moves (in visible order). Otherwise only the dragged item.
pub fn resolve_drag_set(
    dragged: &Item,
    visual_index: usize,
    selection: &[SelectionKey],
    visible: &[Item],
) -> DragSet {
    let key = SelectionKey::for_item(dragged, visual_index);
    if selection.is_empty() || !selection.contains(&key) {
        return DragSet::single(dragged.clone(), visual_index);
    }

    let selected: HashSet<&SelectionKey> = selection.iter().collect();
    let mut items = Vec::with_capacity(selection.len());
    let mut visual_indices = Vec::with_capacity(selection.len());
    for (idx, item) in visible.iter().enumerate() {
        if selected.contains(&SelectionKey::for_item(item, idx)) {
            items.push(item.clone());
            visual_indices.push(idx);
        }
    }

    if items.is_empty() {
        // Selection keys no longer match the render; drag what is under the pointer.
        return DragSet::single(dragged.clone(), visual_index);
    }
    DragSet {
        items,
        visual_indices,
    }
}
