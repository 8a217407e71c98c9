// In-memory mutation backend: applies intents to plain vectors of item ids.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use serde::Deserialize;

use super::{BackendError, Completion, MutationBackend, MutationIntent};
use crate::model::{CollectionId, Item, ItemId, ItemRef};

/// Mutation kind, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Add,
    Remove,
    Reorder,
}

impl Op {
    fn of(intent: &MutationIntent) -> Self {
        match intent {
            MutationIntent::Add { .. } => Op::Add,
            MutationIntent::Remove { .. } => Op::Remove,
            MutationIntent::Reorder { .. } => Op::Reorder,
        }
    }
}

/// Collections held in memory. Completes immediately unless deferred, in which
/// case completions queue until [`MemoryBackend::complete_next`].
#[derive(Default)]
pub struct MemoryBackend {
    collections: RefCell<HashMap<CollectionId, Vec<ItemId>>>,
    sent: RefCell<Vec<MutationIntent>>,
    fail_next: Cell<Option<Op>>,
    deferred: Cell<bool>,
    pending: RefCell<VecDeque<(MutationIntent, Completion)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_collection(&self, id: CollectionId, ids: &[&str]) {
        self.collections
            .borrow_mut()
            .insert(id, ids.iter().map(|s| ItemId::new(*s)).collect());
    }

    /// Current contents as items with positions.
    pub fn items(&self, id: &CollectionId) -> Vec<Item> {
        self.collections
            .borrow()
            .get(id)
            .map(|ids| {
                ids.iter()
                    .enumerate()
                    .map(|(position, id)| Item {
                        id: id.clone(),
                        position,
                        title: String::new(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Current contents as plain id strings.
    pub fn ids(&self, id: &CollectionId) -> Vec<String> {
        self.collections
            .borrow()
            .get(id)
            .map(|ids| ids.iter().map(|i| i.0.clone()).collect())
            .unwrap_or_default()
    }

    pub fn collection_ids(&self) -> Vec<CollectionId> {
        let mut ids: Vec<CollectionId> = self.collections.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every intent received so far, in order.
    pub fn sent(&self) -> Vec<MutationIntent> {
        self.sent.borrow().clone()
    }

    /// Make the next mutation of `op` kind fail.
    pub fn fail_next(&self, op: Op) {
        self.fail_next.set(Some(op));
    }

    pub fn set_deferred(&self, deferred: bool) {
        self.deferred.set(deferred);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Settle the oldest deferred mutation. Returns false if none was pending.
    pub fn complete_next(&self) -> bool {
        let next = self.pending.borrow_mut().pop_front();
        match next {
            Some((intent, done)) => {
                let result = self.apply(&intent);
                done(result);
                true
            }
            None => false,
        }
    }

    fn submit(&self, intent: MutationIntent, done: Completion) {
        self.sent.borrow_mut().push(intent.clone());
        if self.deferred.get() {
            self.pending.borrow_mut().push_back((intent, done));
            return;
        }
        let result = self.apply(&intent);
        done(result);
    }

    fn apply(&self, intent: &MutationIntent) -> Result<(), BackendError> {
        if self.fail_next.get() == Some(Op::of(intent)) {
            self.fail_next.set(None);
            return Err(BackendError::Rejected(format!("injected failure for {intent}")));
        }

        let mut collections = self.collections.borrow_mut();
        let list = collections
            .get_mut(intent.collection())
            .ok_or_else(|| BackendError::UnknownCollection(intent.collection().clone()))?;

        match intent {
            MutationIntent::Add {
                items, position, ..
            } => {
                let at = (*position).min(list.len());
                let ids = items.iter().map(|i| i.id.clone());
                list.splice(at..at, ids);
                Ok(())
            }
            MutationIntent::Remove { items, .. } => remove_exact(list, items),
            MutationIntent::Reorder {
                from, to, range, ..
            } => {
                let end = from + range;
                if end > list.len() {
                    return Err(BackendError::PositionOutOfRange {
                        position: end.saturating_sub(1),
                        len: list.len(),
                    });
                }
                let block: Vec<ItemId> = list.drain(*from..end).collect();
                let at = (*to).min(list.len());
                list.splice(at..at, block);
                Ok(())
            }
        }
    }
}

/// Remove exactly the referenced positions, verifying each id.
fn remove_exact(list: &mut Vec<ItemId>, items: &[ItemRef]) -> Result<(), BackendError> {
    for item in items {
        match list.get(item.position) {
            None => {
                return Err(BackendError::PositionOutOfRange {
                    position: item.position,
                    len: list.len(),
                })
            }
            Some(found) if *found != item.id => {
                return Err(BackendError::Mismatch {
                    position: item.position,
                    expected: item.id.clone(),
                    found: found.clone(),
                })
            }
            Some(_) => {}
        }
    }
    let mut positions: Vec<usize> = items.iter().map(|i| i.position).collect();
    positions.sort_unstable();
    positions.dedup();
    for position in positions.into_iter().rev() {
        list.remove(position);
    }
    Ok(())
}

impl MutationBackend for MemoryBackend {
    fn add(&self, collection: &CollectionId, items: &[ItemRef], position: usize, done: Completion) {
        self.submit(
            MutationIntent::Add {
                collection: collection.clone(),
                items: items.to_vec(),
                position,
            },
            done,
        );
    }

    fn remove(&self, collection: &CollectionId, items: &[ItemRef], done: Completion) {
        self.submit(
            MutationIntent::Remove {
                collection: collection.clone(),
                items: items.to_vec(),
            },
            done,
        );
    }

    fn reorder(
        &self,
        collection: &CollectionId,
        from: usize,
        to: usize,
        range: usize,
        done: Completion,
    ) {
        self.submit(
            MutationIntent::Reorder {
                collection: collection.clone(),
                from,
                to,
                range,
            },
            done,
        );
    }
}
