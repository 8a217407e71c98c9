// Mutation intents and the backend seam that carries them out.

pub mod memory;

use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::model::{CollectionId, ItemId, ItemRef};

/// A collection change requested by a drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutationIntent {
    Add {
        collection: CollectionId,
        items: Vec<ItemRef>,
        position: usize,
    },
    /// Removal names exact positions so duplicates of one id are never confused.
    Remove {
        collection: CollectionId,
        items: Vec<ItemRef>,
    },
    /// Move `range` items starting at `from` so the block starts at `to`
    /// in the list with the block taken out.
    Reorder {
        collection: CollectionId,
        from: usize,
        to: usize,
        range: usize,
    },
}

impl MutationIntent {
    pub fn collection(&self) -> &CollectionId {
        match self {
            MutationIntent::Add { collection, .. }
            | MutationIntent::Remove { collection, .. }
            | MutationIntent::Reorder { collection, .. } => collection,
        }
    }
}

impl fmt::Display for MutationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationIntent::Add {
                collection,
                items,
                position,
            } => write!(f, "add({collection}, {} item(s), at={position})", items.len()),
            MutationIntent::Remove { collection, items } => {
                let positions: Vec<String> = items.iter().map(|i| i.position.to_string()).collect();
                write!(f, "remove({collection}, positions=[{}])", positions.join(","))
            }
            MutationIntent::Reorder {
                collection,
                from,
                to,
                range,
            } => write!(f, "reorder({collection}, from={from}, to={to}, range={range})"),
        }
    }
}

/// Failure reported by a mutation backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("unknown collection {0}")]
    UnknownCollection(CollectionId),
    #[error("position {position} out of range (collection length {len})")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("item at position {position} is {found}, expected {expected}")]
    Mismatch {
        position: usize,
        expected: ItemId,
        found: ItemId,
    },
    #[error("mutation rejected: {0}")]
    Rejected(String),
}

/// Called once by the backend when a mutation settles.
pub type Completion = Box<dyn FnOnce(Result<(), BackendError>)>;

/// Persisted collection backend. Every call is asynchronous from the engine's
/// point of view: it returns immediately and reports through `done`.
///
/// Implementations must not hold internal borrows while invoking `done`, since
/// the completion may dispatch the next intent of a chain.
pub trait MutationBackend {
    fn add(&self, collection: &CollectionId, items: &[ItemRef], position: usize, done: Completion);
    fn remove(&self, collection: &CollectionId, items: &[ItemRef], done: Completion);
    fn reorder(
        &self,
        collection: &CollectionId,
        from: usize,
        to: usize,
        range: usize,
        done: Completion,
    );
}

/// Hand one intent to the backend.
pub fn send(backend: &dyn MutationBackend, intent: &MutationIntent, done: Completion) {
    match intent {
        MutationIntent::Add {
            collection,
            items,
            position,
        } => backend.add(collection, items, *position, done),
        MutationIntent::Remove { collection, items } => backend.remove(collection, items, done),
        MutationIntent::Reorder {
            collection,
            from,
            to,
            range,
        } => backend.reorder(collection, *from, *to, *range, done),
    }
}

/// The intents a drop resolved to. Steps run in order; each step is sent only
/// after the previous one reported success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    pub steps: Vec<MutationIntent>,
}

impl DispatchPlan {
    pub fn single(intent: MutationIntent) -> Self {
        Self {
            steps: vec![intent],
        }
    }

    /// `add`, then `remove` once the add has landed.
    pub fn add_then_remove(add: MutationIntent, remove: MutationIntent) -> Self {
        Self {
            steps: vec![add, remove],
        }
    }

    pub fn chain(steps: Vec<MutationIntent>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Run a plan against the backend. `on_success` fires after the final step
/// succeeds. A failed step stops the chain: later steps are never sent.
pub fn dispatch(
    backend: Rc<dyn MutationBackend>,
    plan: DispatchPlan,
    on_success: Option<Box<dyn FnOnce()>>,
) {
    run_steps(backend, plan.steps.into(), on_success);
}

fn run_steps(
    backend: Rc<dyn MutationBackend>,
    mut steps: VecDeque<MutationIntent>,
    on_success: Option<Box<dyn FnOnce()>>,
) {
    let Some(intent) = steps.pop_front() else {
        if let Some(callback) = on_success {
            callback();
        }
        return;
    };

    log::info!("Dispatching {intent}");
    let next = Rc::clone(&backend);
    let label = intent.to_string();
    let done: Completion = Box::new(move |result| match result {
        Ok(()) => run_steps(next, steps, on_success),
        Err(e) => {
            if steps.is_empty() {
                log::warn!("{label} failed: {e}");
            } else {
                log::warn!(
                    "{label} failed: {e}; skipping {} dependent step(s)",
                    steps.len()
                );
            }
        }
    });
    send(backend.as_ref(), &intent, done);
}

#[cfg(test)]
mod tests {
    use super::memory::{MemoryBackend, Op};
    use super::*;
    use std::cell::Cell;

    fn backend() -> Rc<MemoryBackend> {
        let backend = Rc::new(MemoryBackend::new());
        backend.insert_collection(CollectionId::new("x"), &["a", "b", "c"]);
        backend.insert_collection(CollectionId::new("y"), &[]);
        backend
    }

    fn add_y() -> MutationIntent {
        MutationIntent::Add {
            collection: CollectionId::new("y"),
            items: vec![ItemRef::new("b", 1)],
            position: 0,
        }
    }

    fn remove_x() -> MutationIntent {
        MutationIntent::Remove {
            collection: CollectionId::new("x"),
            items: vec![ItemRef::new("b", 1)],
        }
    }

    #[test]
    fn add_then_remove_runs_both_on_success() {
        let backend = backend();
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        dispatch(
            backend.clone(),
            DispatchPlan::add_then_remove(add_y(), remove_x()),
            Some(Box::new(move || flag.set(true))),
        );
        assert_eq!(backend.sent(), vec![add_y(), remove_x()]);
        assert_eq!(backend.ids(&CollectionId::new("x")), vec!["a", "c"]);
        assert_eq!(backend.ids(&CollectionId::new("y")), vec!["b"]);
        assert!(fired.get());
    }

    #[test]
    fn failed_add_never_sends_remove() {
        let backend = backend();
        backend.fail_next(Op::Add);
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        dispatch(
            backend.clone(),
            DispatchPlan::add_then_remove(add_y(), remove_x()),
            Some(Box::new(move || flag.set(true))),
        );
        assert_eq!(backend.sent(), vec![add_y()]);
        assert_eq!(backend.ids(&CollectionId::new("x")), vec!["a", "b", "c"]);
        assert!(!fired.get());
    }

    #[test]
    fn deferred_remove_waits_for_add_completion() {
        let backend = backend();
        backend.set_deferred(true);
        dispatch(
            backend.clone(),
            DispatchPlan::add_then_remove(add_y(), remove_x()),
            None,
        );
        assert_eq!(backend.sent(), vec![add_y()]);
        assert!(backend.complete_next());
        assert_eq!(backend.sent(), vec![add_y(), remove_x()]);
    }

    #[test]
    fn intent_display_is_readable() {
        let intent = MutationIntent::Reorder {
            collection: CollectionId::new("x"),
            from: 0,
            to: 2,
            range: 2,
        };
        assert_eq!(intent.to_string(), "reorder(x, from=0, to=2, range=2)");
    }

    #[test]
    fn intent_serializes_with_op_tag() {
        let json = serde_json::to_value(add_y()).unwrap();
        assert_eq!(json["op"], "add");
        assert_eq!(json["collection"], "y");
        assert_eq!(json["position"], 0);
    }
}
