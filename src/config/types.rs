use serde::Deserialize;
use std::path::Path;

use crate::model::DragMode;

const VALID_COPY_TOGGLES: &[&str] = &["ctrl", "meta", "either"];
const VALID_DRAG_MODES: &[&str] = &["copy", "move"];

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub autoscroll: AutoScrollConfig,
    pub drop: DropConfig,
    pub modifiers: ModifiersConfig,
    pub panels: PanelDefaultsConfig,
}

/// Edge auto-scroll tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoScrollConfig {
    /// Distance from a container's top/bottom edge (px) that activates scrolling.
    pub edge_size: f32,
    /// Speed reached with the pointer at (or past) the edge, in px/s.
    pub max_speed: f32,
    /// Speed at the inner boundary of the edge zone, in px/s.
    pub min_speed: f32,
}

/// Drop-position computation tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct DropConfig {
    /// Height of the fixed list header inside every scroll container.
    pub header_height: f32,
    /// Row height assumed when a panel has no materialized rows.
    pub fallback_row_height: f32,
    /// Ask the target virtualizer to scroll the insertion point into view after a drop.
    pub reveal_after_drop: bool,
}

/// Which held key inverts the source panel's default drag mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyToggle {
    Ctrl,
    Meta,
    Either,
}

/// Modifier key configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiersConfig {
    pub copy_toggle: CopyToggle,
}

/// Defaults applied to panels that do not configure their own values.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDefaultsConfig {
    pub default_mode: DragMode,
}

/// Errors that can occur during config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Validation(String),
}

// ── Serde intermediate structs ──────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    autoscroll: RawAutoScrollConfig,
    drop: RawDropConfig,
    modifiers: RawModifiersConfig,
    panels: RawPanelDefaultsConfig,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawAutoScrollConfig {
    edge_size: f32,
    max_speed: f32,
    min_speed: f32,
}

impl Default for RawAutoScrollConfig {
    fn default() -> Self {
        let d = AutoScrollConfig::default();
        Self {
            edge_size: d.edge_size,
            max_speed: d.max_speed,
            min_speed: d.min_speed,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawDropConfig {
    header_height: f32,
    fallback_row_height: f32,
    reveal_after_drop: bool,
}

impl Default for RawDropConfig {
    fn default() -> Self {
        let d = DropConfig::default();
        Self {
            header_height: d.header_height,
            fallback_row_height: d.fallback_row_height,
            reveal_after_drop: d.reveal_after_drop,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawModifiersConfig {
    copy_toggle: String,
}

impl Default for RawModifiersConfig {
    fn default() -> Self {
        Self {
            copy_toggle: "either".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawPanelDefaultsConfig {
    default_mode: String,
}

impl Default for RawPanelDefaultsConfig {
    fn default() -> Self {
        Self {
            default_mode: "move".to_string(),
        }
    }
}

// ── Default impls ───────────────────────────────────────────────────────

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            edge_size: 48.0,
            max_speed: 900.0,
            min_speed: 60.0,
        }
    }
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            header_height: 0.0,
            fallback_row_height: 40.0,
            reveal_after_drop: true,
        }
    }
}

impl Default for ModifiersConfig {
    fn default() -> Self {
        Self {
            copy_toggle: CopyToggle::Either,
        }
    }
}

impl Default for PanelDefaultsConfig {
    fn default() -> Self {
        Self {
            default_mode: DragMode::Move,
        }
    }
}

impl CopyToggle {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "ctrl" => Some(CopyToggle::Ctrl),
            "meta" => Some(CopyToggle::Meta),
            "either" => Some(CopyToggle::Either),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            CopyToggle::Ctrl => "ctrl",
            CopyToggle::Meta => "meta",
            CopyToggle::Either => "either",
        }
    }
}

// ── Config implementation ───────────────────────────────────────────────

impl EngineConfig {
    /// Load config from a TOML file path. Returns defaults if file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse a TOML string into a config.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let copy_toggle = CopyToggle::parse(&raw.modifiers.copy_toggle).ok_or_else(|| {
            ConfigError::Validation(format!(
                "unknown copy_toggle '{}', valid values: {}",
                raw.modifiers.copy_toggle,
                VALID_COPY_TOGGLES.join(", ")
            ))
        })?;
        let default_mode = DragMode::parse(&raw.panels.default_mode).ok_or_else(|| {
            ConfigError::Validation(format!(
                "unknown default_mode '{}', valid modes: {}",
                raw.panels.default_mode,
                VALID_DRAG_MODES.join(", ")
            ))
        })?;

        let config = Self {
            autoscroll: AutoScrollConfig {
                edge_size: raw.autoscroll.edge_size,
                max_speed: raw.autoscroll.max_speed,
                min_speed: raw.autoscroll.min_speed,
            },
            drop: DropConfig {
                header_height: raw.drop.header_height,
                fallback_row_height: raw.drop.fallback_row_height,
                reveal_after_drop: raw.drop.reveal_after_drop,
            },
            modifiers: ModifiersConfig { copy_toggle },
            panels: PanelDefaultsConfig { default_mode },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the config, returning an error if any values are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autoscroll.edge_size <= 0.0 {
            return Err(ConfigError::Validation(
                "autoscroll edge_size must be > 0".to_string(),
            ));
        }
        if self.autoscroll.min_speed < 0.0 {
            return Err(ConfigError::Validation(
                "autoscroll min_speed must be >= 0".to_string(),
            ));
        }
        if self.autoscroll.max_speed < self.autoscroll.min_speed {
            return Err(ConfigError::Validation(
                "autoscroll max_speed must be >= min_speed".to_string(),
            ));
        }
        if self.drop.header_height < 0.0 {
            return Err(ConfigError::Validation(
                "drop header_height must be >= 0".to_string(),
            ));
        }
        if self.drop.fallback_row_height <= 0.0 {
            return Err(ConfigError::Validation(
                "drop fallback_row_height must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the default configuration as TOML.
    pub fn print_default() -> String {
        let d = Self::default();
        format!(
            "[autoscroll]\n\
             edge_size = {:.1}\n\
             max_speed = {:.1}\n\
             min_speed = {:.1}\n\
             \n\
             [drop]\n\
             header_height = {:.1}\n\
             fallback_row_height = {:.1}\n\
             reveal_after_drop = {}\n\
             \n\
             [modifiers]\n\
             copy_toggle = \"{}\"\n\
             \n\
             [panels]\n\
             default_mode = \"{}\"\n",
            d.autoscroll.edge_size,
            d.autoscroll.max_speed,
            d.autoscroll.min_speed,
            d.drop.header_height,
            d.drop.fallback_row_height,
            d.drop.reveal_after_drop,
            d.modifiers.copy_toggle.as_str(),
            d.panels.default_mode,
        )
    }
}
