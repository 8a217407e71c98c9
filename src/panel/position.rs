// Drop position math: pointer Y → insertion index in the visible list and
// the matching collection-relative position.

use std::collections::HashSet;

use serde::Serialize;

use super::VirtualRow;
use crate::model::Item;

/// How a drop position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSource {
    /// Computed from the pointer against materialized row geometry.
    Pointer,
    /// Taken from the hovered item because no row geometry was available.
    Fallback,
}

/// Result of mapping the pointer into a target panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropPosition {
    /// Insertion index in the panel's visible list (`len` = append).
    pub visible_index: usize,
    /// Insertion position in the full collection.
    pub collection_position: usize,
    pub source: PositionSource,
}

/// Inputs for [`compute_drop_position`].
#[derive(Debug, Clone, Copy)]
pub struct PositionInput<'a> {
    /// The target panel's visible item list.
    pub items: &'a [Item],
    /// Materialized rows, in visual order.
    pub rows: &'a [VirtualRow],
    pub container_top: f32,
    pub scroll_offset: f32,
    pub header_height: f32,
    pub pointer_y: f32,
    /// Number of items being dragged (1 for a single drag).
    pub drag_count: usize,
    /// Collection positions of dragged items that live in the target collection.
    /// Empty when source and target collections differ.
    pub dragged_positions: &'a HashSet<usize>,
    /// Row height used when no row is materialized.
    pub fallback_row_height: f32,
}

/// Compute the insertion point for the pointer.
///
/// Insertion reasons about a row's top edge while the pointer sits mid-row, and
/// a multi-item overlay is taller than one row, so the content Y is shifted up by
/// half a row plus `(drag_count - 1)` half rows before scanning row midpoints.
pub fn compute_drop_position(input: &PositionInput<'_>) -> DropPosition {
    let content_y = input.pointer_y - input.container_top + input.scroll_offset - input.header_height;
    let row_height = input
        .rows
        .first()
        .map(|r| r.size)
        .filter(|h| *h > 0.0)
        .unwrap_or(input.fallback_row_height);
    let extra = input.drag_count.saturating_sub(1) as f32 * row_height / 2.0;
    let adjusted_y = content_y - row_height / 2.0 - extra;

    let visible_index = input
        .rows
        .iter()
        .filter(|row| row.index < input.items.len())
        .find(|row| row.midpoint() > adjusted_y)
        .map(|row| row.index)
        .unwrap_or(input.items.len());

    DropPosition {
        visible_index,
        collection_position: collection_position_for(
            input.items,
            visible_index,
            input.dragged_positions,
        ),
        source: PositionSource::Pointer,
    }
}

/// Position of the hovered item itself, used when pointer math cannot run.
pub fn fallback_position(
    items: &[Item],
    visible_index: usize,
    dragged_positions: &HashSet<usize>,
) -> DropPosition {
    let visible_index = visible_index.min(items.len());
    DropPosition {
        visible_index,
        collection_position: collection_position_for(items, visible_index, dragged_positions),
        source: PositionSource::Fallback,
    }
}

/// Map a visible insertion index to a collection position. Dragged items are
/// never valid insertion anchors, so the scan skips them.
pub fn collection_position_for(
    items: &[Item],
    visible_index: usize,
    dragged_positions: &HashSet<usize>,
) -> usize {
    let append = items.last().map(|item| item.position + 1).unwrap_or(0);
    items
        .iter()
        .skip(visible_index)
        .find(|item| !dragged_positions.contains(&item.position))
        .map(|item| item.position)
        .unwrap_or(append)
}
