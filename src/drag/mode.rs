// Copy/move decision for a gesture.

use crate::model::DragMode;

/// Inputs for [`resolve_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeInputs {
    /// Source and target are the same panel bound to the same collection.
    pub same_panel_and_collection: bool,
    /// The source panel's default mode. `None` for drags from outside any panel.
    pub source_default: Option<DragMode>,
    /// Whether the copy/move toggle key is held right now.
    pub toggle_held: bool,
    /// Only editable sources honour the toggle key.
    pub source_editable: bool,
}

/// Resolve the effective mode.
///
/// A drag within one panel over its own collection is always a reorder: a copy
/// into the position space being dragged within is meaningless. Drags without a
/// source panel can only copy.
pub fn resolve_mode(inputs: ModeInputs) -> DragMode {
    if inputs.same_panel_and_collection {
        return DragMode::Move;
    }
    let Some(default) = inputs.source_default else {
        return DragMode::Copy;
    };
    if inputs.toggle_held && inputs.source_editable {
        default.inverted()
    } else {
        default
    }
}
