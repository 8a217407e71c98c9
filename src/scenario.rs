// Scripted replay: a TOML file declares collections, panels and a list of
// pointer steps, which are fed through a `DragEngine` backed by memory.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::drag::session::{DragOrigin, SessionView};
use crate::drag::{DragEngine, DropOutcome, Notice};
use crate::geometry::Rect;
use crate::input::{Modifiers, PointerSample};
use crate::model::{CollectionId, DragMode, Item, PanelId, SelectionKey, SurfaceId};
use crate::mutation::memory::{MemoryBackend, Op};
use crate::panel::uniform::UniformRows;
use crate::panel::PanelDescriptor;
use crate::scroll::ScrollStep;
use crate::selection::MemorySelectionStore;

const DEFAULT_ROW_HEIGHT: f32 = 40.0;
const DEFAULT_FRAME_MS: u64 = 16;

/// Errors in a replay script.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("duplicate collection {0}")]
    DuplicateCollection(CollectionId),
    #[error("duplicate panel {0}")]
    DuplicatePanel(PanelId),
    #[error("panel {panel} references unknown collection {collection}")]
    UnknownCollection {
        panel: PanelId,
        collection: CollectionId,
    },
    #[error("panel {panel}: selected index {index} is out of range")]
    SelectionOutOfRange { panel: PanelId, index: usize },
    #[error("step {step}: {message}")]
    InvalidStep { step: usize, message: String },
}

/// A replay script.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub collections: Vec<CollectionSetup>,
    #[serde(default)]
    pub panels: Vec<PanelSetup>,
    #[serde(default)]
    pub surfaces: Vec<SurfaceSetup>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSetup {
    pub id: CollectionId,
    pub items: Vec<String>,
}

/// A mounted panel. Its visible list is its collection in natural order.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelSetup {
    pub id: PanelId,
    #[serde(default)]
    pub collection: Option<CollectionId>,
    pub bounds: Rect,
    #[serde(default = "default_row_height")]
    pub row_height: f32,
    #[serde(default)]
    pub scroll: f32,
    #[serde(default)]
    pub overscan: usize,
    #[serde(default = "enabled")]
    pub editable: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub mode: Option<DragMode>,
    #[serde(default = "enabled")]
    pub drop_eligible: bool,
    /// Selected visual indices.
    #[serde(default)]
    pub selection: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceSetup {
    pub id: SurfaceId,
    pub bounds: Rect,
}

/// One scripted input.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Start on a panel row, or with `items` from outside any panel.
    Start {
        #[serde(default)]
        panel: Option<PanelId>,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        items: Vec<String>,
        x: f32,
        y: f32,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        meta: bool,
    },
    Move {
        x: f32,
        y: f32,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        meta: bool,
    },
    /// Advance the clock `count` frames of `ms` each.
    Frame {
        #[serde(default = "default_frame_ms")]
        ms: u64,
        #[serde(default = "one")]
        count: u32,
    },
    End {
        x: f32,
        y: f32,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        meta: bool,
    },
    Cancel,
    /// Make the backend's next mutation of this kind fail.
    Fail { op: Op },
}

fn default_row_height() -> f32 {
    DEFAULT_ROW_HEIGHT
}

fn default_frame_ms() -> u64 {
    DEFAULT_FRAME_MS
}

fn enabled() -> bool {
    true
}

fn one() -> u32 {
    1
}

fn modifiers(ctrl: bool, meta: bool) -> Modifiers {
    Modifiers {
        ctrl,
        meta,
        ..Modifiers::NONE
    }
}

/// Something observable that happened during a replay.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Started {
        step: usize,
        session: Option<SessionView>,
    },
    StartFailed {
        step: usize,
        error: String,
    },
    Moved {
        step: usize,
        session: Option<SessionView>,
    },
    Scrolled {
        step: usize,
        scroll: Vec<ScrollStep>,
    },
    Dropped {
        step: usize,
        outcome: DropOutcome,
        notice: Option<Notice>,
    },
    Cancelled {
        step: usize,
        active: bool,
    },
}

/// Replay result: the event log and every collection's final contents.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub events: Vec<Event>,
    pub collections: BTreeMap<CollectionId, Vec<String>>,
}

impl Scenario {
    /// Load a scenario from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario =
            toml::from_str(toml_str).map_err(|e| ScenarioError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        let mut collections = HashSet::new();
        for collection in &self.collections {
            if !collections.insert(&collection.id) {
                return Err(ScenarioError::DuplicateCollection(collection.id.clone()));
            }
        }

        let mut panels = HashSet::new();
        for panel in &self.panels {
            if !panels.insert(&panel.id) {
                return Err(ScenarioError::DuplicatePanel(panel.id.clone()));
            }
            let len = match &panel.collection {
                Some(id) => self
                    .collection(id)
                    .map(|c| c.items.len())
                    .ok_or_else(|| ScenarioError::UnknownCollection {
                        panel: panel.id.clone(),
                        collection: id.clone(),
                    })?,
                None => 0,
            };
            if let Some(&index) = panel.selection.iter().find(|&&i| i >= len) {
                return Err(ScenarioError::SelectionOutOfRange {
                    panel: panel.id.clone(),
                    index,
                });
            }
        }

        for (step, action) in self.steps.iter().enumerate() {
            if let Step::Start {
                panel,
                index,
                items,
                ..
            } = action
            {
                let origin_ok = match (panel, index) {
                    (Some(_), Some(_)) => items.is_empty(),
                    (None, None) => !items.is_empty(),
                    _ => false,
                };
                if !origin_ok {
                    return Err(ScenarioError::InvalidStep {
                        step,
                        message: "start needs either panel and index, or items".into(),
                    });
                }
            }
        }
        Ok(())
    }

    fn collection(&self, id: &CollectionId) -> Option<&CollectionSetup> {
        self.collections.iter().find(|c| &c.id == id)
    }
}

/// Replay `scenario` against a fresh in-memory backend.
pub fn run(scenario: &Scenario, config: EngineConfig) -> Result<Report, ScenarioError> {
    scenario.validate()?;

    let backend = Rc::new(MemoryBackend::new());
    for collection in &scenario.collections {
        let ids: Vec<&str> = collection.items.iter().map(String::as_str).collect();
        backend.insert_collection(collection.id.clone(), &ids);
    }
    let selection = Rc::new(MemorySelectionStore::new());
    let mut engine = DragEngine::new(config, selection.clone(), backend.clone());

    // The registry only holds weak bindings; the replay owns the lists.
    let mut views = Vec::with_capacity(scenario.panels.len());
    for setup in &scenario.panels {
        let items = setup
            .collection
            .as_ref()
            .map(|id| backend.items(id))
            .unwrap_or_default();
        let view = UniformRows::with_overscan(setup.bounds, setup.row_height, items.len(), setup.overscan);
        view.set_scroll(setup.scroll);

        let keys = setup
            .selection
            .iter()
            .filter_map(|&i| items.get(i).map(|item| SelectionKey::for_item(item, i)))
            .collect();
        selection.select(&setup.id, keys);

        engine
            .registry_mut()
            .register_panel(descriptor(setup), &view, items);
        views.push(view);
    }
    for surface in &scenario.surfaces {
        engine
            .registry_mut()
            .register_surface(surface.id.clone(), surface.bounds);
    }

    let clock = Instant::now();
    let mut elapsed = Duration::ZERO;
    let mut events = Vec::with_capacity(scenario.steps.len());
    for (step, action) in scenario.steps.iter().enumerate() {
        log::debug!("Step {step}: {action:?}");
        match action {
            Step::Start {
                panel,
                index,
                items,
                x,
                y,
                ctrl,
                meta,
            } => {
                let origin = match (panel, index) {
                    (Some(panel), Some(index)) => DragOrigin::Panel {
                        panel: panel.clone(),
                        visible_index: *index,
                    },
                    _ => DragOrigin::External {
                        items: items
                            .iter()
                            .enumerate()
                            .map(|(i, id)| Item::new(id.as_str(), i))
                            .collect(),
                    },
                };
                let sample = PointerSample::new(*x, *y, modifiers(*ctrl, *meta));
                match engine.on_drag_start(origin, sample, clock + elapsed) {
                    Ok(()) => events.push(Event::Started {
                        step,
                        session: engine.session(),
                    }),
                    Err(e) => events.push(Event::StartFailed {
                        step,
                        error: e.to_string(),
                    }),
                }
            }
            Step::Move { x, y, ctrl, meta } => {
                engine.on_drag_move(PointerSample::new(*x, *y, modifiers(*ctrl, *meta)));
                events.push(Event::Moved {
                    step,
                    session: engine.session(),
                });
            }
            Step::Frame { ms, count } => {
                let mut scroll = Vec::new();
                for _ in 0..*count {
                    elapsed += Duration::from_millis(*ms);
                    scroll.extend(engine.on_frame(clock + elapsed));
                }
                events.push(Event::Scrolled { step, scroll });
            }
            Step::End { x, y, ctrl, meta } => {
                let outcome =
                    engine.on_drag_end(PointerSample::new(*x, *y, modifiers(*ctrl, *meta)));
                events.push(Event::Dropped {
                    step,
                    outcome,
                    notice: engine.take_notice(),
                });
                refresh_panels(&mut engine, &backend, &scenario.panels, &views);
            }
            Step::Cancel => {
                let active = engine.on_drag_cancel();
                events.push(Event::Cancelled { step, active });
            }
            Step::Fail { op } => backend.fail_next(*op),
        }
    }

    let collections = backend
        .collection_ids()
        .into_iter()
        .map(|id| {
            let ids = backend.ids(&id);
            (id, ids)
        })
        .collect();
    Ok(Report {
        events,
        collections,
    })
}

/// Re-render every panel from its collection once a drop has landed.
fn refresh_panels(
    engine: &mut DragEngine,
    backend: &MemoryBackend,
    panels: &[PanelSetup],
    views: &[Rc<UniformRows>],
) {
    for (setup, view) in panels.iter().zip(views) {
        let Some(collection) = &setup.collection else {
            continue;
        };
        let items = backend.items(collection);
        view.count.set(items.len());
        // Re-clamp the offset against the new content height.
        view.set_scroll(view.scroll.get());
        engine.registry_mut().set_visible_items(&setup.id, items);
    }
}

fn descriptor(setup: &PanelSetup) -> PanelDescriptor {
    PanelDescriptor {
        id: setup.id.clone(),
        collection: setup.collection.clone(),
        editable: setup.editable,
        locked: setup.locked,
        default_mode: setup.mode,
        drop_eligible: setup.drop_eligible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;
    use crate::mutation::MutationIntent;
    use std::io::Write;

    const TWO_PANELS: &str = r#"
[[collections]]
id = "x"
items = ["a0", "a1", "a2"]

[[collections]]
id = "y"
items = ["b0", "b1", "b2", "b3"]

[[panels]]
id = "left"
collection = "x"
bounds = { x = 0.0, y = 0.0, width = 300.0, height = 400.0 }
mode = "move"

[[panels]]
id = "right"
collection = "y"
bounds = { x = 300.0, y = 0.0, width = 300.0, height = 400.0 }
"#;

    fn with_steps(steps: &str) -> Scenario {
        Scenario::from_toml(&format!("{TWO_PANELS}\n{steps}")).unwrap()
    }

    // ── Parsing ─────────────────────────────────────────────────────

    #[test]
    fn parses_panels_with_defaults() {
        let scenario = with_steps("");
        assert_eq!(scenario.panels.len(), 2);
        let right = &scenario.panels[1];
        assert_eq!(right.row_height, 40.0);
        assert!(right.editable);
        assert!(right.drop_eligible);
        assert_eq!(right.mode, None);
        assert_eq!(scenario.panels[0].mode, Some(DragMode::Move));
    }

    #[test]
    fn parses_every_step_kind() {
        let scenario = with_steps(
            r#"
[[steps]]
action = "start"
panel = "left"
index = 0
x = 10.0
y = 10.0

[[steps]]
action = "move"
x = 20.0
y = 20.0
ctrl = true

[[steps]]
action = "frame"
count = 3

[[steps]]
action = "fail"
op = "add"

[[steps]]
action = "end"
x = 20.0
y = 20.0

[[steps]]
action = "cancel"
"#,
        );
        assert_eq!(scenario.steps.len(), 6);
        assert!(matches!(scenario.steps[1], Step::Move { ctrl: true, meta: false, .. }));
        assert!(matches!(scenario.steps[2], Step::Frame { ms: 16, count: 3 }));
        assert!(matches!(scenario.steps[3], Step::Fail { op: Op::Add }));
    }

    #[test]
    fn unknown_collection_is_rejected() {
        let err = Scenario::from_toml(
            r#"
[[panels]]
id = "p"
collection = "nope"
bounds = { x = 0.0, y = 0.0, width = 10.0, height = 10.0 }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownCollection { .. }));
    }

    #[test]
    fn selection_out_of_range_is_rejected() {
        let err = Scenario::from_toml(&TWO_PANELS.replace("mode = \"move\"", "selection = [7]"))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::SelectionOutOfRange { index: 7, .. }));
    }

    #[test]
    fn start_without_origin_is_rejected() {
        let err = Scenario::from_toml(&format!(
            "{TWO_PANELS}\n[[steps]]\naction = \"start\"\npanel = \"left\"\nx = 0.0\ny = 0.0\n"
        ))
        .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidStep { step: 0, .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            Scenario::from_toml("[[panels]\nid ="),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{TWO_PANELS}").unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.collections.len(), 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Scenario::load(&dir.path().join("missing.toml")),
            Err(ScenarioError::Io(_))
        ));
    }

    // ── Replay ──────────────────────────────────────────────────────

    #[test]
    fn cross_collection_move_replays_to_final_collections() {
        let scenario = with_steps(
            r#"
[[steps]]
action = "start"
panel = "left"
index = 1
x = 10.0
y = 50.0

[[steps]]
action = "move"
x = 310.0
y = 90.0

[[steps]]
action = "end"
x = 310.0
y = 90.0
"#,
        );
        let report = run(&scenario, EngineConfig::default()).unwrap();
        assert_eq!(report.events.len(), 3);
        match &report.events[2] {
            Event::Dropped {
                outcome: DropOutcome::Dispatched { plan, .. },
                ..
            } => {
                assert_eq!(plan.len(), 2);
                assert!(matches!(plan.steps[0], MutationIntent::Add { position: 2, .. }));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(report.collections[&CollectionId::new("x")], vec!["a0", "a2"]);
        assert_eq!(
            report.collections[&CollectionId::new("y")],
            vec!["b0", "b1", "a1", "b2", "b3"]
        );
    }

    #[test]
    fn later_drags_see_earlier_drops() {
        let scenario = with_steps(
            r#"
[[steps]]
action = "start"
panel = "left"
index = 1
x = 10.0
y = 50.0

[[steps]]
action = "end"
x = 310.0
y = 10.0

[[steps]]
action = "start"
panel = "right"
index = 0
x = 310.0
y = 10.0

[[steps]]
action = "end"
x = 310.0
y = 170.0
"#,
        );
        let report = run(&scenario, EngineConfig::default()).unwrap();
        match &report.events[2] {
            Event::Started {
                session: Some(view),
                ..
            } => assert_eq!(view.active_item.id, ItemId::new("a1")),
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(
            report.collections[&CollectionId::new("y")],
            vec!["b0", "b1", "b2", "a1", "b3"]
        );
    }

    #[test]
    fn injected_add_failure_keeps_source_intact() {
        let scenario = with_steps(
            r#"
[[steps]]
action = "fail"
op = "add"

[[steps]]
action = "start"
panel = "left"
index = 1
x = 10.0
y = 50.0

[[steps]]
action = "end"
x = 310.0
y = 90.0
"#,
        );
        let report = run(&scenario, EngineConfig::default()).unwrap();
        assert_eq!(report.collections[&CollectionId::new("x")], vec!["a0", "a1", "a2"]);
        assert_eq!(report.collections[&CollectionId::new("y")].len(), 4);
    }

    #[test]
    fn second_start_is_reported_not_fatal() {
        let scenario = with_steps(
            r#"
[[steps]]
action = "start"
panel = "left"
index = 0
x = 10.0
y = 10.0

[[steps]]
action = "start"
panel = "left"
index = 1
x = 10.0
y = 50.0

[[steps]]
action = "cancel"
"#,
        );
        let report = run(&scenario, EngineConfig::default()).unwrap();
        assert!(matches!(report.events[1], Event::StartFailed { step: 1, .. }));
        assert!(matches!(report.events[2], Event::Cancelled { active: true, .. }));
    }

    #[test]
    fn frames_report_scrolling() {
        let many: Vec<String> = (0..40).map(|i| format!("\"t{i}\"")).collect();
        let toml = format!(
            r#"
[[collections]]
id = "x"
items = [{}]

[[panels]]
id = "p"
collection = "x"
bounds = {{ x = 0.0, y = 0.0, width = 300.0, height = 400.0 }}

[[steps]]
action = "start"
panel = "p"
index = 0
x = 10.0
y = 10.0

[[steps]]
action = "move"
x = 10.0
y = 398.0

[[steps]]
action = "frame"
count = 4
"#,
            many.join(", ")
        );
        let report = run(&Scenario::from_toml(&toml).unwrap(), EngineConfig::default()).unwrap();
        match &report.events[2] {
            Event::Scrolled { scroll, .. } => {
                assert_eq!(scroll.len(), 4);
                assert!(scroll.iter().all(|s| s.delta > 0.0));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn events_serialize_with_tags() {
        let event = Event::Cancelled {
            step: 3,
            active: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "cancelled");
        assert_eq!(json["step"], 3);
    }
}
