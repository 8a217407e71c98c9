// Target resolution: which panel (and which row of it) is under the pointer.
//
// Virtualized lists leave gaps with no row nodes, and overscanned rows can sit
// outside their own scroll container, so item hits are filtered by the
// container bounds that actually contain the pointer.

use super::{PanelEntry, PanelGeometry, PanelRegistry};
use crate::geometry::Point;
use crate::model::{PanelId, SurfaceId};

/// What the pointer is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// A materialized row; carries the precise "make room" index.
    Item {
        panel: PanelId,
        visible_index: usize,
    },
    /// Panel area without a row under the pointer.
    PanelBackground { panel: PanelId },
    /// A non-panel surface; drops here trigger a side effect, not a mutation.
    ExternalSurface { surface: SurfaceId },
}

impl TargetKind {
    /// The panel this target belongs to, if any.
    pub fn panel(&self) -> Option<&PanelId> {
        match self {
            TargetKind::Item { panel, .. } | TargetKind::PanelBackground { panel } => Some(panel),
            TargetKind::ExternalSurface { .. } => None,
        }
    }
}

struct ItemHit<'a> {
    panel: &'a PanelId,
    visible_index: usize,
}

/// Resolve the drop target under `pointer`.
///
/// Surfaces are tested first, then panels. Item targets outrank the panel
/// background of the same panel. Drop-ineligible panels and panels whose
/// geometry is gone never produce a target.
pub fn resolve_target(
    pointer: Point,
    registry: &PanelRegistry,
    header_height: f32,
) -> Option<TargetKind> {
    if let Some(surface) = registry
        .surfaces()
        .iter()
        .rev()
        .find(|s| s.bounds.contains(pointer))
    {
        return Some(TargetKind::ExternalSurface {
            surface: surface.id.clone(),
        });
    }

    let mounted: Vec<(&PanelEntry, PanelGeometry)> = registry
        .panels_topmost_first()
        .into_iter()
        .filter_map(|entry| match entry.geometry() {
            Some(geometry) => Some((entry, geometry)),
            None => {
                log::debug!("Panel {} has no live geometry, skipping", entry.id());
                None
            }
        })
        .collect();

    let item_hits = collect_item_hits(pointer, &mounted, header_height);

    // Bounds decide the panel; hit-tests alone cannot, since gaps have no rows.
    let (container, _) = mounted
        .iter()
        .find(|(_, geometry)| geometry.bounds.contains(pointer))?;

    if !container.descriptor.drop_eligible {
        return None;
    }

    let panel = container.id();
    match item_hits.iter().find(|hit| hit.panel == panel) {
        Some(hit) => Some(TargetKind::Item {
            panel: panel.clone(),
            visible_index: hit.visible_index,
        }),
        None => Some(TargetKind::PanelBackground {
            panel: panel.clone(),
        }),
    }
}

fn collect_item_hits<'a>(
    pointer: Point,
    mounted: &[(&'a PanelEntry, PanelGeometry)],
    header_height: f32,
) -> Vec<ItemHit<'a>> {
    let mut hits = Vec::new();
    for (entry, geometry) in mounted {
        let item_count = entry.items().len();
        for row in &geometry.rows {
            // Rows past the item list belong to a refresh the registry has not seen yet.
            if row.index >= item_count {
                continue;
            }
            if geometry.row_rect(row, header_height).contains(pointer) {
                hits.push(ItemHit {
                    panel: entry.id(),
                    visible_index: row.index,
                });
            }
        }
    }
    hits
}
