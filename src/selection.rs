// Selection store seam: per-panel multi-selection, keyed by `SelectionKey`.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::model::{PanelId, SelectionKey};

/// Host-owned multi-selection state.
///
/// The engine reads it at drag start and only writes to clear a source panel's
/// selection after a multi-item cross-collection move.
pub trait SelectionStore {
    /// Selected keys of a panel, in selection order.
    fn selection(&self, panel: &PanelId) -> Vec<SelectionKey>;
    fn clear(&self, panel: &PanelId);
}

/// Simple in-memory store, used by the replay binary and tests.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    selections: RefCell<HashMap<PanelId, Vec<SelectionKey>>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a panel's selection. Duplicate keys are dropped.
    pub fn select(&self, panel: &PanelId, keys: Vec<SelectionKey>) {
        let mut unique: Vec<SelectionKey> = Vec::with_capacity(keys.len());
        for key in keys {
            if !unique.contains(&key) {
                unique.push(key);
            }
        }
        self.selections.borrow_mut().insert(panel.clone(), unique);
    }
}

impl SelectionStore for MemorySelectionStore {
    fn selection(&self, panel: &PanelId) -> Vec<SelectionKey> {
        self.selections
            .borrow()
            .get(panel)
            .cloned()
            .unwrap_or_default()
    }

    fn clear(&self, panel: &PanelId) {
        self.selections.borrow_mut().remove(panel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;

    fn key(id: &str, idx: usize) -> SelectionKey {
        SelectionKey::new(ItemId::new(id), idx)
    }

    #[test]
    fn empty_panel_has_no_selection() {
        let store = MemorySelectionStore::new();
        assert!(store.selection(&PanelId::new("a")).is_empty());
    }

    #[test]
    fn select_dedups_and_keeps_order() {
        let store = MemorySelectionStore::new();
        let panel = PanelId::new("a");
        store.select(&panel, vec![key("t2", 2), key("t0", 0), key("t2", 2)]);
        assert_eq!(store.selection(&panel), vec![key("t2", 2), key("t0", 0)]);
    }

    #[test]
    fn clear_removes_only_that_panel() {
        let store = MemorySelectionStore::new();
        let a = PanelId::new("a");
        let b = PanelId::new("b");
        store.select(&a, vec![key("t0", 0)]);
        store.select(&b, vec![key("t1", 1)]);
        store.clear(&a);
        assert!(store.selection(&a).is_empty());
        assert_eq!(store.selection(&b).len(), 1);
    }
}
