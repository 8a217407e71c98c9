use std::path::PathBuf;

use anyhow::{bail, Context};
use trackdrop::config::EngineConfig;
use trackdrop::scenario::{self, Scenario};

const USAGE: &str = "usage: trackdrop [--config PATH] SCENARIO.toml\n       trackdrop --print-default-config";

fn main() -> anyhow::Result<()> {
    // Handle --print-default-config before any other initialization
    if std::env::args().any(|a| a == "--print-default-config") {
        print!("{}", EngineConfig::print_default());
        return Ok(());
    }

    env_logger::init();
    log::info!("trackdrop v{} starting", env!("CARGO_PKG_VERSION"));

    let (config_path, scenario_path) = parse_args(std::env::args().skip(1))?;

    let config_path = config_path.unwrap_or_else(dirs_config_path);
    let config = match EngineConfig::load(&config_path) {
        Ok(cfg) => {
            log::info!("Config loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            log::warn!("Config load error ({}), using defaults", e);
            EngineConfig::default()
        }
    };
    log::info!(
        "Edge size: {}, copy toggle: {:?}, default mode: {}",
        config.autoscroll.edge_size,
        config.modifiers.copy_toggle,
        config.panels.default_mode
    );

    let scenario = Scenario::load(&scenario_path)
        .with_context(|| format!("loading scenario {}", scenario_path.display()))?;
    let report = scenario::run(&scenario, config).context("replaying scenario")?;

    for event in &report.events {
        println!("{}", serde_json::to_string(event)?);
    }
    println!(
        "{}",
        serde_json::json!({ "collections": report.collections })
    );
    Ok(())
}

fn parse_args(
    mut args: impl Iterator<Item = String>,
) -> anyhow::Result<(Option<PathBuf>, PathBuf)> {
    let mut config = None;
    let mut scenario = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a path\n{USAGE}");
                };
                config = Some(PathBuf::from(path));
            }
            "-h" | "--help" => bail!("{USAGE}"),
            _ if scenario.is_none() => scenario = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument {arg}\n{USAGE}"),
        }
    }
    let Some(scenario) = scenario else {
        bail!("{USAGE}");
    };
    Ok((config, scenario))
}

/// Get the config file path (~/.config/trackdrop/config.toml).
fn dirs_config_path() -> PathBuf {
    dirs_home()
        .join(".config")
        .join("trackdrop")
        .join("config.toml")
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
