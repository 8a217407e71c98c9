// Drag orchestration: the idle → dragging → resolving → idle state machine that
// composes target resolution, drop positions, mode and index correction, and
// hands the resulting intents to the mutation backend.

pub mod adjust;
pub mod dragset;
pub mod mode;
pub mod plan;
pub mod session;

use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::input::{Modifiers, PointerSample, PointerTracker};
use crate::model::{DragMode, Item, PanelId, SurfaceId};
use crate::mutation::{dispatch, DispatchPlan, MutationBackend};
use crate::panel::collision::{resolve_target, TargetKind};
use crate::panel::position::{compute_drop_position, fallback_position, DropPosition, PositionInput};
use crate::panel::{PanelEntry, PanelRegistry};
use crate::scroll::{EdgeAutoScroller, ScrollContainer, ScrollStep};
use crate::selection::SelectionStore;

use adjust::adjust_target_position;
use dragset::{resolve_drag_set, DragSet};
use mode::{resolve_mode, ModeInputs};
use plan::{plan_drop, DropContext, PlannedDrop};
use session::{DragOrigin, DragSession, InsertionMarker, SessionView, SourceContext};

/// Lifecycle state. A session exists only in `Dragging` and while resolving.
#[derive(Debug)]
pub enum DragState {
    Idle,
    Dragging(Box<DragSession>),
    /// Transient: the drop is being resolved and dispatched.
    Resolving,
}

/// Misuse of the drag lifecycle, reported from `on_drag_start`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("a drag is already active ({0})")]
    SessionActive(String),
    #[error("unknown panel {0}")]
    UnknownPanel(PanelId),
    #[error("panel {0} is locked")]
    PanelLocked(PanelId),
    #[error("visible index {index} out of range for panel {panel} ({len} items)")]
    ItemOutOfRange {
        panel: PanelId,
        index: usize,
        len: usize,
    },
    #[error("drag carries no items")]
    EmptyDrag,
}

/// Transient user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
}

/// Why a drop did not dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DropRejection {
    /// Source, target or collection context missing at drop time.
    InvalidSession { detail: String },
    TargetNotEditable { panel: PanelId, notice: Notice },
    NoTarget,
    /// The source list changed under the drag; its positions can no longer be trusted.
    StaleSnapshot { item: Item },
}

/// Result of a drag end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    Dispatched { mode: DragMode, plan: DispatchPlan },
    /// The drop would leave everything where it is.
    NoOp,
    /// Dropped on a non-panel surface; the host performs the side effect.
    Surface { surface: SurfaceId, items: Vec<Item> },
    Rejected(DropRejection),
}

/// The drag-and-drop engine. Owns the registry and the single drag session.
pub struct DragEngine {
    config: EngineConfig,
    registry: PanelRegistry,
    selection: Rc<dyn SelectionStore>,
    backend: Rc<dyn MutationBackend>,
    state: DragState,
    pointer: PointerTracker,
    scroller: EdgeAutoScroller,
    notice: Option<Notice>,
}

impl DragEngine {
    pub fn new(
        config: EngineConfig,
        selection: Rc<dyn SelectionStore>,
        backend: Rc<dyn MutationBackend>,
    ) -> Self {
        let scroller = EdgeAutoScroller::new(config.autoscroll.clone());
        Self {
            config,
            registry: PanelRegistry::new(),
            selection,
            backend,
            state: DragState::Idle,
            pointer: PointerTracker::new(),
            scroller,
            notice: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &PanelRegistry {
        &self.registry
    }

    /// Panels mount and unmount through the registry.
    pub fn registry_mut(&mut self) -> &mut PanelRegistry {
        &mut self.registry
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Read-only view of the active session, if any.
    pub fn session(&self) -> Option<SessionView> {
        match &self.state {
            DragState::Dragging(session) => Some(session.view()),
            _ => None,
        }
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn autoscroll_running(&self) -> bool {
        self.scroller.is_running()
    }

    /// Take the pending user notice, if any.
    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Start a drag. Fails without side effects if a drag is already active.
    pub fn on_drag_start(
        &mut self,
        origin: DragOrigin,
        sample: PointerSample,
        now: Instant,
    ) -> Result<(), DragError> {
        match &self.state {
            DragState::Idle => {}
            DragState::Dragging(session) => {
                return Err(DragError::SessionActive(session.drag_id.clone()))
            }
            DragState::Resolving => return Err(DragError::SessionActive("resolving".into())),
        }

        let session = match origin {
            DragOrigin::Panel {
                panel,
                visible_index,
            } => self.panel_session(panel, visible_index)?,
            DragOrigin::External { items } => {
                let dragged = items.first().cloned().ok_or(DragError::EmptyDrag)?;
                DragSession::new(dragged, None, DragSet::external(items), 0, Vec::new(), None)
            }
        };

        log::info!(
            "Drag start {} ({} item(s), selection {})",
            session.drag_id,
            session.drag_set.len(),
            session.selection_count
        );
        self.state = DragState::Dragging(Box::new(session));
        self.pointer.begin(sample);
        self.scroller.start(now);
        self.refresh_target();
        Ok(())
    }

    fn panel_session(&self, panel: PanelId, visible_index: usize) -> Result<DragSession, DragError> {
        let entry = self
            .registry
            .panel(&panel)
            .ok_or_else(|| DragError::UnknownPanel(panel.clone()))?;
        if entry.descriptor.locked {
            return Err(DragError::PanelLocked(panel));
        }
        let items = entry.items();
        let dragged = items
            .get(visible_index)
            .cloned()
            .ok_or_else(|| DragError::ItemOutOfRange {
                panel: panel.clone(),
                index: visible_index,
                len: items.len(),
            })?;

        let selection = self.selection.selection(&panel);
        let drag_set = resolve_drag_set(&dragged, visible_index, &selection, items);
        let source = SourceContext {
            panel,
            collection: entry.descriptor.collection.clone(),
            editable: entry.descriptor.editable,
            default_mode: entry
                .descriptor
                .default_mode
                .unwrap_or(self.config.panels.default_mode),
        };
        Ok(DragSession::new(
            dragged,
            Some(source),
            drag_set,
            selection.len(),
            items.to_vec(),
            Some(visible_index),
        ))
    }

    /// Pointer moved. Recomputes target, insertion point and mode preview.
    pub fn on_drag_move(&mut self, sample: PointerSample) {
        if !self.is_dragging() {
            return;
        }
        self.pointer.sample(sample);
        self.refresh_target();
    }

    /// Modifier keys changed without pointer movement.
    pub fn on_modifiers(&mut self, modifiers: Modifiers) {
        if !self.is_dragging() {
            return;
        }
        self.pointer.set_modifiers(modifiers);
        self.refresh_target();
    }

    /// Animation frame. Scrolls the container the pointer is near the edge of,
    /// then re-targets since content moved under a possibly stationary pointer.
    pub fn on_frame(&mut self, now: Instant) -> Option<ScrollStep> {
        if !self.is_dragging() {
            return None;
        }
        let containers: Vec<ScrollContainer> = self
            .registry
            .panels_topmost_first()
            .into_iter()
            .filter_map(|entry| {
                let bounds = entry.virtualizer()?.container_bounds()?;
                Some(ScrollContainer {
                    panel: entry.id().clone(),
                    bounds,
                })
            })
            .collect();

        let step = self.scroller.tick(now, self.pointer.position(), &containers)?;
        let virtualizer = self
            .registry
            .panel(&step.panel)
            .and_then(PanelEntry::virtualizer)?;
        virtualizer.scroll_by(step.delta);
        self.refresh_target();
        Some(step)
    }

    /// Drop. Always returns to idle; the session, tracker and auto-scroll end here.
    pub fn on_drag_end(&mut self, sample: PointerSample) -> DropOutcome {
        if self.is_dragging() {
            self.pointer.sample(sample);
            self.refresh_target();
        }

        let state = std::mem::replace(&mut self.state, DragState::Resolving);
        self.pointer.end();
        self.scroller.stop();

        let outcome = match state {
            DragState::Dragging(session) => self.resolve_drop(&session),
            _ => DropOutcome::Rejected(DropRejection::InvalidSession {
                detail: "drag end without an active drag".into(),
            }),
        };
        self.state = DragState::Idle;

        match &outcome {
            DropOutcome::Dispatched { mode, plan } => {
                log::info!("Drop dispatched as {mode} ({} step(s))", plan.len())
            }
            DropOutcome::NoOp => log::info!("Drop left items in place"),
            DropOutcome::Surface { surface, items } => {
                log::info!("Dropped {} item(s) on surface {surface}", items.len())
            }
            DropOutcome::Rejected(DropRejection::TargetNotEditable { notice, .. }) => {
                log::warn!("Drop aborted: {}", notice.message);
                self.notice = Some(notice.clone());
            }
            DropOutcome::Rejected(DropRejection::NoTarget) => log::info!("Dropped outside any target"),
            DropOutcome::Rejected(reason) => log::warn!("Drop aborted: {reason:?}"),
        }
        outcome
    }

    /// Cancel. Returns false if no drag was active.
    pub fn on_drag_cancel(&mut self) -> bool {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        self.pointer.end();
        self.scroller.stop();
        match state {
            DragState::Dragging(session) => {
                log::info!("Drag cancelled {}", session.drag_id);
                true
            }
            _ => false,
        }
    }

    // ── Per-move resolution ─────────────────────────────────────────

    fn refresh_target(&mut self) {
        let DragState::Dragging(session) = &mut self.state else {
            return;
        };
        let sample = self.pointer.last();
        let target = resolve_target(sample.position, &self.registry, self.config.drop.header_height);
        if target != session.target {
            log::debug!("Drag {} target -> {:?}", session.drag_id, target);
        }

        let target_entry = target
            .as_ref()
            .and_then(TargetKind::panel)
            .and_then(|panel| self.registry.panel(panel));
        let position = match (&target, target_entry) {
            (Some(kind), Some(entry)) => {
                locate_drop(&self.config, session, kind, entry, sample.position.y)
            }
            _ => None,
        };

        session.marker = match (target_entry, position) {
            (Some(entry), Some(pos)) if session.source_panel() != Some(entry.id()) => {
                Some(InsertionMarker {
                    panel: entry.id().clone(),
                    visible_index: pos.visible_index,
                })
            }
            _ => None,
        };
        session.live_mode = resolve_mode(mode_inputs(
            &self.config,
            session,
            target_entry,
            sample.modifiers,
        ));
        session.drop_position = position;
        session.target = target;
    }

    // ── Drop resolution ─────────────────────────────────────────────

    fn resolve_drop(&self, session: &DragSession) -> DropOutcome {
        let reject = |detail: String| {
            DropOutcome::Rejected(DropRejection::InvalidSession { detail })
        };

        let panel = match &session.target {
            None => return DropOutcome::Rejected(DropRejection::NoTarget),
            Some(TargetKind::ExternalSurface { surface }) => {
                return DropOutcome::Surface {
                    surface: surface.clone(),
                    items: session.drag_set.items().to_vec(),
                }
            }
            Some(TargetKind::Item { panel, .. } | TargetKind::PanelBackground { panel }) => panel,
        };

        let Some(entry) = self.registry.panel(panel) else {
            return reject(format!("target panel {panel} is no longer registered"));
        };
        let Some(target_collection) = entry.descriptor.collection.as_ref() else {
            return reject(format!("target panel {panel} has no collection"));
        };
        if !entry.descriptor.editable {
            return DropOutcome::Rejected(DropRejection::TargetNotEditable {
                panel: panel.clone(),
                notice: Notice {
                    message: format!("{panel} is read-only"),
                },
            });
        }
        if let Some(source) = &session.source {
            if !self.registry.contains(&source.panel) {
                return reject(format!("source panel {} is no longer registered", source.panel));
            }
        }
        let Some(position) = session.drop_position else {
            return reject(format!("no drop position in {panel}"));
        };

        let mode = resolve_mode(mode_inputs(
            &self.config,
            session,
            Some(entry),
            self.pointer.modifiers(),
        ));
        let source_collection = session.source.as_ref().and_then(|s| s.collection.as_ref());
        let same_collection = source_collection == Some(target_collection);
        let same_panel = session.source_panel() == Some(panel);
        let adjusted = adjust_target_position(
            position.collection_position,
            &session.drag_set,
            same_collection,
            position.source,
        );

        if mode == DragMode::Move {
            if let Some(item) = self.stale_item(session) {
                return DropOutcome::Rejected(DropRejection::StaleSnapshot { item });
            }
        }

        let planned = plan_drop(&DropContext {
            drag_set: &session.drag_set,
            source_collection,
            source_editable: session.source.as_ref().is_some_and(|s| s.editable),
            target_collection,
            same_panel,
            mode,
            raw: position.collection_position,
            adjusted,
        });
        let plan = match planned {
            PlannedDrop::NoOp => return DropOutcome::NoOp,
            PlannedDrop::Dispatch(plan) => plan,
        };

        let on_success = self.selection_clear_after(session, same_collection, mode);
        dispatch(Rc::clone(&self.backend), plan.clone(), on_success);

        if self.config.drop.reveal_after_drop {
            if let Some(virtualizer) = entry.virtualizer() {
                virtualizer.scroll_to_index(position.visible_index);
            }
        }
        DropOutcome::Dispatched { mode, plan }
    }

    /// First drag-set item whose row no longer matches the drag-start snapshot.
    fn stale_item(&self, session: &DragSession) -> Option<Item> {
        let source = session.source.as_ref()?;
        let current = self.registry.panel(&source.panel)?.items();
        session
            .drag_set
            .items()
            .iter()
            .zip(session.drag_set.visual_indices())
            .find(|(item, idx)| current.get(**idx) != Some(*item))
            .map(|(item, _)| item.clone())
    }

    /// Multi-item moves out of a collection clear the source selection once landed.
    fn selection_clear_after(
        &self,
        session: &DragSession,
        same_collection: bool,
        mode: DragMode,
    ) -> Option<Box<dyn FnOnce()>> {
        let source = session.source.as_ref()?;
        if same_collection || mode != DragMode::Move || session.drag_set.len() < 2 {
            return None;
        }
        let store = Rc::clone(&self.selection);
        let panel = source.panel.clone();
        Some(Box::new(move || {
            log::debug!("Clearing selection of {panel}");
            store.clear(&panel);
        }))
    }
}

fn mode_inputs(
    config: &EngineConfig,
    session: &DragSession,
    target: Option<&PanelEntry>,
    modifiers: Modifiers,
) -> ModeInputs {
    let same_panel_and_collection = match (&session.source, target) {
        (Some(source), Some(entry)) => {
            &source.panel == entry.id()
                && source.collection.is_some()
                && source.collection == entry.descriptor.collection
        }
        _ => false,
    };
    ModeInputs {
        same_panel_and_collection,
        source_default: session.source.as_ref().map(|s| s.default_mode),
        toggle_held: modifiers.copy_toggle_held(config.modifiers.copy_toggle),
        source_editable: session.source.as_ref().is_some_and(|s| s.editable),
    }
}

/// Insertion point for `target` inside `entry`. Falls back to the hovered
/// item's own position when no row geometry is available.
fn locate_drop(
    config: &EngineConfig,
    session: &DragSession,
    target: &TargetKind,
    entry: &PanelEntry,
    pointer_y: f32,
) -> Option<DropPosition> {
    let same_collection = match &session.source {
        Some(source) => source.collection.is_some() && source.collection == entry.descriptor.collection,
        None => false,
    };
    let dragged: HashSet<usize> = if same_collection {
        session.drag_set.positions()
    } else {
        HashSet::new()
    };
    let items = entry.items();
    let hovered = match target {
        TargetKind::Item { visible_index, .. } => Some(*visible_index),
        _ => None,
    };

    match entry.geometry() {
        Some(geometry) if !geometry.rows.is_empty() || hovered.is_none() => {
            Some(compute_drop_position(&PositionInput {
                items,
                rows: &geometry.rows,
                container_top: geometry.bounds.top(),
                scroll_offset: geometry.scroll_offset,
                header_height: config.drop.header_height,
                pointer_y,
                drag_count: session.drag_set.len(),
                dragged_positions: &dragged,
                fallback_row_height: config.drop.fallback_row_height,
            }))
        }
        _ => hovered.map(|idx| fallback_position(items, idx, &dragged)),
    }
}
