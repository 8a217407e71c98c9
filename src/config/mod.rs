// Engine configuration loaded from TOML.

pub mod types;

pub use types::{
    AutoScrollConfig, ConfigError, CopyToggle, DropConfig, EngineConfig, ModifiersConfig,
    PanelDefaultsConfig,
};
