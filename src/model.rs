// Core data model: identifiers, items, selection keys and drag modes.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Stable identifier of a track. Not unique within a collection: the same
    /// track may appear several times in one playlist.
    ItemId
);
string_id!(
    /// Identifier of a backing collection (e.g. a playlist).
    CollectionId
);
string_id!(
    /// Identifier of a panel, assigned by the surrounding layout system.
    PanelId
);
string_id!(
    /// Identifier of a non-panel drop surface such as a playback target.
    SurfaceId
);

/// An element of an ordered collection as rendered in a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Index in the full, unfiltered, unsorted collection.
    pub position: usize,
    #[serde(default)]
    pub title: String,
}

impl Item {
    pub fn new(id: impl Into<String>, position: usize) -> Self {
        Self {
            id: ItemId::new(id),
            position,
            title: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// The reference carried by mutation intents.
    pub fn to_ref(&self) -> ItemRef {
        ItemRef {
            id: self.id.clone(),
            position: self.position,
        }
    }
}

/// Identifier plus collection position; the position disambiguates duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: ItemId,
    pub position: usize,
}

impl ItemRef {
    pub fn new(id: impl Into<String>, position: usize) -> Self {
        Self {
            id: ItemId::new(id),
            position,
        }
    }
}

/// Selection identity: item id plus its visual index in the current render.
///
/// Collection positions can repeat for duplicated tracks across refreshes, the
/// visual index is always unique within one render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionKey {
    pub id: ItemId,
    pub visual_index: usize,
}

impl SelectionKey {
    pub fn new(id: ItemId, visual_index: usize) -> Self {
        Self { id, visual_index }
    }

    pub fn for_item(item: &Item, visual_index: usize) -> Self {
        Self::new(item.id.clone(), visual_index)
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.visual_index)
    }
}

/// Whether a drop duplicates the dragged items or relocates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    Copy,
    Move,
}

impl DragMode {
    pub fn inverted(self) -> Self {
        match self {
            DragMode::Copy => DragMode::Move,
            DragMode::Move => DragMode::Copy,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "copy" => Some(DragMode::Copy),
            "move" => Some(DragMode::Move),
            _ => None,
        }
    }
}

impl fmt::Display for DragMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragMode::Copy => f.write_str("copy"),
            DragMode::Move => f.write_str("move"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_ref_keeps_position() {
        let item = Item::new("t1", 7).with_title("Intro");
        assert_eq!(item.to_ref(), ItemRef::new("t1", 7));
    }

    #[test]
    fn selection_keys_distinguish_duplicates_by_visual_index() {
        let a = Item::new("dup", 3);
        let b = Item::new("dup", 3);
        assert_ne!(SelectionKey::for_item(&a, 0), SelectionKey::for_item(&b, 1));
    }

    #[test]
    fn drag_mode_inversion_round_trips() {
        assert_eq!(DragMode::Copy.inverted(), DragMode::Move);
        assert_eq!(DragMode::Move.inverted().inverted(), DragMode::Move);
    }

    #[test]
    fn drag_mode_parse_rejects_unknown() {
        assert_eq!(DragMode::parse("copy"), Some(DragMode::Copy));
        assert_eq!(DragMode::parse("link"), None);
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&PanelId::new("left")).unwrap();
        assert_eq!(json, "\"left\"");
    }
}
