// Drag-and-drop orchestration for virtualized, multi-panel track lists.

pub mod config;
pub mod drag;
pub mod geometry;
pub mod input;
pub mod model;
pub mod mutation;
pub mod panel;
pub mod scenario;
pub mod scroll;
pub mod selection;

pub use drag::{DragEngine, DragError, DropOutcome, DropRejection};
pub use model::{CollectionId, DragMode, Item, ItemId, ItemRef, PanelId, SurfaceId};
pub use mutation::{MutationBackend, MutationIntent};
pub use panel::{PanelDescriptor, PanelRegistry, Virtualizer};
