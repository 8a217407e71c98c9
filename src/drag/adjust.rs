// Target-index correction for items removed ahead of the insertion point.

use super::dragset::DragSet;
use crate::panel::position::PositionSource;

/// Correct a raw collection position for the removal of dragged items.
///
/// Positions of different collections live in independent spaces and are left
/// alone. A single item placed by pointer math needs no correction either: the
/// item has not been conceptually removed from the list it is hovering. In every
/// other case the raw position shifts left by the number of dragged items that
/// sit strictly before it.
pub fn adjust_target_position(
    raw: usize,
    drag_set: &DragSet,
    same_collection: bool,
    source: PositionSource,
) -> usize {
    if !same_collection {
        return raw;
    }
    if drag_set.len() == 1 && source == PositionSource::Pointer {
        return raw;
    }
    let ahead = drag_set
        .items()
        .iter()
        .filter(|item| item.position < raw)
        .count();
    raw.saturating_sub(ahead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use proptest::prelude::*;

    fn set(positions: &[usize]) -> DragSet {
        DragSet::external(
            positions
                .iter()
                .map(|p| Item::new(format!("t{p}"), *p))
                .collect(),
        )
    }

    #[test]
    fn different_collections_are_not_adjusted() {
        assert_eq!(adjust_target_position(4, &set(&[0, 1]), false, PositionSource::Pointer), 4);
    }

    #[test]
    fn single_pointer_drop_is_not_adjusted() {
        assert_eq!(adjust_target_position(3, &set(&[1]), true, PositionSource::Pointer), 3);
    }

    #[test]
    fn single_fallback_drop_is_adjusted() {
        assert_eq!(adjust_target_position(3, &set(&[1]), true, PositionSource::Fallback), 2);
    }

    #[test]
    fn contiguous_pair_ahead_of_target() {
        assert_eq!(adjust_target_position(4, &set(&[0, 1]), true, PositionSource::Pointer), 2);
    }

    #[test]
    fn only_items_strictly_before_target_count() {
        assert_eq!(adjust_target_position(3, &set(&[1, 3, 5]), true, PositionSource::Pointer), 2);
    }

    #[test]
    fn target_before_all_dragged_items_is_unchanged() {
        assert_eq!(adjust_target_position(0, &set(&[2, 3]), true, PositionSource::Pointer), 0);
    }

    proptest! {
        #[test]
        fn adjusted_never_exceeds_raw(
            raw in 0usize..200,
            positions in proptest::collection::btree_set(0usize..200, 1..20),
            same in any::<bool>(),
        ) {
            let positions: Vec<usize> = positions.into_iter().collect();
            let drag_set = set(&positions);
            let adjusted = adjust_target_position(raw, &drag_set, same, PositionSource::Pointer);
            prop_assert!(adjusted <= raw);
            if !same {
                prop_assert_eq!(adjusted, raw);
            }
        }
    }
}
