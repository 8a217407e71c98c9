// Panel registry: id-keyed table of live panel bindings (virtualizer geometry,
// visible items, drop eligibility) plus non-panel drop surfaces.

pub mod collision;
pub mod position;
pub mod uniform;

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::geometry::Rect;
use crate::model::{CollectionId, DragMode, Item, PanelId, SurfaceId};

/// A materialized row reported by a panel's virtualizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualRow {
    /// Index into the panel's visible (filtered/sorted) item list.
    pub index: usize,
    /// Offset of the row's top edge from the start of the list content, in px.
    pub start: f32,
    pub size: f32,
}

impl VirtualRow {
    pub fn new(index: usize, start: f32, size: f32) -> Self {
        Self { index, start, size }
    }

    pub fn midpoint(&self) -> f32 {
        self.start + self.size / 2.0
    }
}

/// Geometry provider owned by the host's virtualization component.
///
/// Methods take `&self`; hosts keep scroll state behind interior mutability.
pub trait Virtualizer {
    /// Rows currently materialized, in visual order.
    fn visible_rows(&self) -> Vec<VirtualRow>;
    /// Current scrollTop of the scroll container.
    fn scroll_offset(&self) -> f32;
    /// Bounding rect of the scroll container, or `None` once it is unmounted.
    fn container_bounds(&self) -> Option<Rect>;
    fn scroll_to_index(&self, index: usize);
    /// Scroll by `delta` px (positive = down). The host clamps to its content.
    fn scroll_by(&self, delta: f32);
}

/// Layout-owned panel attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDescriptor {
    pub id: PanelId,
    pub collection: Option<CollectionId>,
    pub editable: bool,
    /// A locked panel cannot be a drag source.
    pub locked: bool,
    /// `None` falls back to the engine-wide default.
    pub default_mode: Option<DragMode>,
    /// False while the view is sorted/filtered away from natural order.
    pub drop_eligible: bool,
}

impl PanelDescriptor {
    /// An editable, unlocked, drop-eligible panel bound to `collection`.
    pub fn new(id: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            id: PanelId::new(id),
            collection: Some(CollectionId::new(collection)),
            editable: true,
            locked: false,
            default_mode: None,
            drop_eligible: true,
        }
    }

    pub fn with_mode(mut self, mode: DragMode) -> Self {
        self.default_mode = Some(mode);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn drop_ineligible(mut self) -> Self {
        self.drop_eligible = false;
        self
    }
}

/// Point-in-time geometry of a mounted panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelGeometry {
    pub bounds: Rect,
    pub scroll_offset: f32,
    pub rows: Vec<VirtualRow>,
}

impl PanelGeometry {
    /// Viewport rect of a materialized row. Overscanned rows may fall outside `bounds`.
    pub fn row_rect(&self, row: &VirtualRow, header_height: f32) -> Rect {
        Rect::new(
            self.bounds.x,
            self.bounds.y + header_height + row.start - self.scroll_offset,
            self.bounds.width,
            row.size,
        )
    }
}

/// A registered panel.
pub struct PanelEntry {
    pub descriptor: PanelDescriptor,
    binding: Weak<dyn Virtualizer>,
    items: Vec<Item>,
    mount_seq: u64,
}

impl PanelEntry {
    pub fn id(&self) -> &PanelId {
        &self.descriptor.id
    }

    /// The panel's current visible/filtered item list.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Live virtualizer, if the host still owns it.
    pub fn virtualizer(&self) -> Option<Rc<dyn Virtualizer>> {
        self.binding.upgrade()
    }

    /// Snapshot of the panel's geometry. `None` when the virtualizer was dropped
    /// or its scroll container is unmounted.
    pub fn geometry(&self) -> Option<PanelGeometry> {
        let v = self.binding.upgrade()?;
        let bounds = v.container_bounds()?;
        Some(PanelGeometry {
            bounds,
            scroll_offset: v.scroll_offset(),
            rows: v.visible_rows(),
        })
    }
}

/// A registered non-panel drop surface (e.g. a playback target).
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceEntry {
    pub id: SurfaceId,
    pub bounds: Rect,
}

/// Id-keyed table of panel bindings and drop surfaces.
///
/// Entries do not own their virtualizers: the host keeps the `Rc` and the
/// registry holds a `Weak`.
#[derive(Default)]
pub struct PanelRegistry {
    panels: HashMap<PanelId, PanelEntry>,
    surfaces: Vec<SurfaceEntry>,
    next_seq: u64,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a panel. Re-registering moves it to the top of
    /// the stacking order.
    pub fn register_panel<V: Virtualizer + 'static>(
        &mut self,
        descriptor: PanelDescriptor,
        binding: &Rc<V>,
        items: Vec<Item>,
    ) {
        let weak: Weak<V> = Rc::downgrade(binding);
        let binding: Weak<dyn Virtualizer> = weak;
        self.next_seq += 1;
        log::debug!(
            "Registering panel {} ({} visible items, drop eligible: {})",
            descriptor.id,
            items.len(),
            descriptor.drop_eligible
        );
        self.panels.insert(
            descriptor.id.clone(),
            PanelEntry {
                descriptor,
                binding,
                items,
                mount_seq: self.next_seq,
            },
        );
    }

    /// Remove a panel. Returns true if it was registered.
    pub fn unregister_panel(&mut self, id: &PanelId) -> bool {
        let removed = self.panels.remove(id).is_some();
        if removed {
            log::debug!("Unregistered panel {id}");
        }
        removed
    }

    /// Replace the panel's visible item list (after a refresh, filter or sort).
    pub fn set_visible_items(&mut self, id: &PanelId, items: Vec<Item>) -> bool {
        match self.panels.get_mut(id) {
            Some(entry) => {
                entry.items = items;
                true
            }
            None => false,
        }
    }

    pub fn set_drop_eligible(&mut self, id: &PanelId, eligible: bool) -> bool {
        match self.panels.get_mut(id) {
            Some(entry) => {
                entry.descriptor.drop_eligible = eligible;
                true
            }
            None => false,
        }
    }

    pub fn panel(&self, id: &PanelId) -> Option<&PanelEntry> {
        self.panels.get(id)
    }

    pub fn contains(&self, id: &PanelId) -> bool {
        self.panels.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Panels ordered topmost (most recently mounted) first.
    pub fn panels_topmost_first(&self) -> Vec<&PanelEntry> {
        let mut entries: Vec<&PanelEntry> = self.panels.values().collect();
        entries.sort_by(|a, b| b.mount_seq.cmp(&a.mount_seq));
        entries
    }

    pub fn register_surface(&mut self, id: SurfaceId, bounds: Rect) {
        self.surfaces.retain(|s| s.id != id);
        self.surfaces.push(SurfaceEntry { id, bounds });
    }

    pub fn unregister_surface(&mut self, id: &SurfaceId) -> bool {
        let before = self.surfaces.len();
        self.surfaces.retain(|s| &s.id != id);
        self.surfaces.len() != before
    }

    pub fn surfaces(&self) -> &[SurfaceEntry] {
        &self.surfaces
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{items, UniformRows};
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = PanelRegistry::new();
        let v = UniformRows::new(Rect::new(0.0, 0.0, 300.0, 400.0), 40.0, 3);
        registry.register_panel(PanelDescriptor::new("a", "x"), &v, items(&["t0", "t1", "t2"]));
        let entry = registry.panel(&PanelId::new("a")).unwrap();
        assert_eq!(entry.items().len(), 3);
        assert_eq!(entry.descriptor.collection, Some(CollectionId::new("x")));
    }

    #[test]
    fn unregister_removes_entry() {
        let mut registry = PanelRegistry::new();
        let v = UniformRows::new(Rect::new(0.0, 0.0, 300.0, 400.0), 40.0, 0);
        registry.register_panel(PanelDescriptor::new("a", "x"), &v, Vec::new());
        assert!(registry.unregister_panel(&PanelId::new("a")));
        assert!(!registry.unregister_panel(&PanelId::new("a")));
        assert!(registry.is_empty());
    }

    #[test]
    fn geometry_none_after_virtualizer_dropped() {
        let mut registry = PanelRegistry::new();
        let v = UniformRows::new(Rect::new(0.0, 0.0, 300.0, 400.0), 40.0, 3);
        registry.register_panel(PanelDescriptor::new("a", "x"), &v, items(&["t0", "t1", "t2"]));
        drop(v);
        assert!(registry.panel(&PanelId::new("a")).unwrap().geometry().is_none());
    }

    #[test]
    fn geometry_none_when_container_unmounted() {
        let mut registry = PanelRegistry::new();
        let v = UniformRows::new(Rect::new(0.0, 0.0, 300.0, 400.0), 40.0, 3);
        registry.register_panel(PanelDescriptor::new("a", "x"), &v, items(&["t0", "t1", "t2"]));
        v.bounds.set(None);
        assert!(registry.panel(&PanelId::new("a")).unwrap().geometry().is_none());
    }

    #[test]
    fn row_rect_accounts_for_header_and_scroll() {
        let geometry = PanelGeometry {
            bounds: Rect::new(10.0, 100.0, 200.0, 300.0),
            scroll_offset: 80.0,
            rows: Vec::new(),
        };
        let rect = geometry.row_rect(&VirtualRow::new(3, 120.0, 40.0), 20.0);
        assert_eq!(rect, Rect::new(10.0, 160.0, 200.0, 40.0));
    }

    #[test]
    fn topmost_is_most_recently_registered() {
        let mut registry = PanelRegistry::new();
        let v = UniformRows::new(Rect::new(0.0, 0.0, 300.0, 400.0), 40.0, 0);
        registry.register_panel(PanelDescriptor::new("a", "x"), &v, Vec::new());
        registry.register_panel(PanelDescriptor::new("b", "y"), &v, Vec::new());
        let order: Vec<&str> = registry
            .panels_topmost_first()
            .iter()
            .map(|e| e.id().as_str())
            .collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn set_drop_eligible_updates_descriptor() {
        let mut registry = PanelRegistry::new();
        let v = UniformRows::new(Rect::new(0.0, 0.0, 300.0, 400.0), 40.0, 0);
        registry.register_panel(PanelDescriptor::new("a", "x"), &v, Vec::new());
        assert!(registry.set_drop_eligible(&PanelId::new("a"), false));
        assert!(!registry.panel(&PanelId::new("a")).unwrap().descriptor.drop_eligible);
        assert!(!registry.set_drop_eligible(&PanelId::new("zz"), false));
    }

    #[test]
    fn surfaces_replace_by_id() {
        let mut registry = PanelRegistry::new();
        registry.register_surface(SurfaceId::new("player"), Rect::new(0.0, 0.0, 10.0, 10.0));
        registry.register_surface(SurfaceId::new("player"), Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(registry.surfaces().len(), 1);
        assert_eq!(registry.surfaces()[0].bounds.x, 5.0);
        assert!(registry.unregister_surface(&SurfaceId::new("player")));
    }
}
