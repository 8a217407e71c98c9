// Drop planning: turn a resolved drop (mode, positions, identities) into the
// mutation intents that carry it out.

use crate::model::{CollectionId, DragMode, ItemRef};
use crate::mutation::{DispatchPlan, MutationIntent};

use super::dragset::DragSet;

/// Everything the decision table looks at.
#[derive(Debug, Clone, Copy)]
pub struct DropContext<'a> {
    pub drag_set: &'a DragSet,
    /// `None` for drags without a source panel, or a source panel without a collection.
    pub source_collection: Option<&'a CollectionId>,
    pub source_editable: bool,
    pub target_collection: &'a CollectionId,
    pub same_panel: bool,
    pub mode: DragMode,
    /// Collection position computed from the pointer (or the fallback).
    pub raw: usize,
    /// `raw` corrected for dragged items ahead of it.
    pub adjusted: usize,
}

impl DropContext<'_> {
    fn same_collection(&self) -> bool {
        self.source_collection == Some(self.target_collection)
    }
}

/// What a drop turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedDrop {
    Dispatch(DispatchPlan),
    /// The items would land where they already are.
    NoOp,
}

/// Select the intents for a drop.
pub fn plan_drop(ctx: &DropContext<'_>) -> PlannedDrop {
    let refs = ctx.drag_set.refs();
    let add_raw = MutationIntent::Add {
        collection: ctx.target_collection.clone(),
        items: refs.clone(),
        position: ctx.raw,
    };

    let Some(source_collection) = ctx.source_collection else {
        return PlannedDrop::Dispatch(DispatchPlan::single(add_raw));
    };
    if ctx.mode == DragMode::Copy {
        return PlannedDrop::Dispatch(DispatchPlan::single(add_raw));
    }

    if !ctx.same_collection() {
        if !ctx.source_editable {
            return PlannedDrop::Dispatch(DispatchPlan::single(add_raw));
        }
        let remove = MutationIntent::Remove {
            collection: source_collection.clone(),
            items: refs,
        };
        return PlannedDrop::Dispatch(DispatchPlan::add_then_remove(add_raw, remove));
    }

    let collection = ctx.target_collection;
    if ctx.drag_set.len() == 1 || ctx.drag_set.is_contiguous() {
        let Some(from) = ctx.drag_set.min_position() else {
            return PlannedDrop::NoOp;
        };
        // A single item placed by the pointer keeps its raw position, which still
        // counts the item itself. Reorder addresses the list without the block.
        let to = without_dragged(ctx.raw, ctx.drag_set);
        if from == to {
            return PlannedDrop::NoOp;
        }
        return PlannedDrop::Dispatch(DispatchPlan::single(MutationIntent::Reorder {
            collection: collection.clone(),
            from,
            to,
            range: ctx.drag_set.len(),
        }));
    }

    if ctx.same_panel {
        // The add lands while the originals are still in place, so it uses the raw
        // position and the removal addresses the originals' shifted positions.
        let remove = MutationIntent::Remove {
            collection: collection.clone(),
            items: shifted_refs(&refs, ctx.raw, refs.len()),
        };
        return PlannedDrop::Dispatch(DispatchPlan::add_then_remove(add_raw, remove));
    }

    let steps = chained_reorders(collection, ctx.drag_set, ctx.adjusted);
    if steps.is_empty() {
        PlannedDrop::NoOp
    } else {
        PlannedDrop::Dispatch(DispatchPlan::chain(steps))
    }
}

/// `raw` as an index into the list with every dragged item taken out.
fn without_dragged(raw: usize, drag_set: &DragSet) -> usize {
    let ahead = drag_set
        .items()
        .iter()
        .filter(|item| item.position < raw)
        .count();
    raw.saturating_sub(ahead)
}

/// Positions of `refs` after `count` items were inserted at `at`.
fn shifted_refs(refs: &[ItemRef], at: usize, count: usize) -> Vec<ItemRef> {
    refs.iter()
        .map(|r| ItemRef {
            id: r.id.clone(),
            position: if r.position >= at {
                r.position + count
            } else {
                r.position
            },
        })
        .collect()
}

/// Single-item reorders that together move a non-contiguous drag set into one
/// block starting at `to` (an index in the list without the dragged items).
///
/// Items moving towards the end are placed first, furthest target first, then
/// items moving towards the start, nearest target first. Each step's indices
/// are computed against the list as the previous steps left it.
pub fn chained_reorders(
    collection: &CollectionId,
    drag_set: &DragSet,
    to: usize,
) -> Vec<MutationIntent> {
    let mut dragged: Vec<usize> = drag_set.items().iter().map(|i| i.position).collect();
    dragged.sort_unstable();
    dragged.dedup();
    let Some(&last) = dragged.last() else {
        return Vec::new();
    };

    let count = dragged.len();
    let len = (last + 1).max(to + count);
    let block_start = to.min(len - count);
    let targets: Vec<(usize, usize)> = dragged
        .iter()
        .enumerate()
        .map(|(i, &position)| (position, block_start + i))
        .collect();

    let mut forward: Vec<(usize, usize)> = targets.iter().copied().filter(|(p, t)| t > p).collect();
    forward.sort_by(|a, b| b.1.cmp(&a.1));
    let mut backward: Vec<(usize, usize)> = targets.iter().copied().filter(|(p, t)| t < p).collect();
    backward.sort_by_key(|&(_, t)| t);
    let settled = targets.iter().copied().filter(|(p, t)| t == p);

    // Tokens stand for original positions; only their order matters.
    let mut order: Vec<usize> = (0..len).collect();
    let mut steps = Vec::new();
    for (position, target) in forward.into_iter().chain(backward).chain(settled) {
        let Some(from) = order.iter().position(|&token| token == position) else {
            continue;
        };
        if from == target {
            continue;
        }
        let token = order.remove(from);
        order.insert(target.min(order.len()), token);
        steps.push(MutationIntent::Reorder {
            collection: collection.clone(),
            from,
            to: target,
            range: 1,
        });
    }
    steps
}
