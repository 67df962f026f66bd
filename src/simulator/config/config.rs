use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::arch::cgra::{DataMemConfig, ReadMode};

/// Environment variables `CGRAMEM__<SECTION>__<KEY>` override file settings.
pub const ENV_PREFIX: &str = "CGRAMEM";

/// Simulation driver settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationSection {
  #[serde(default)]
  pub quiet: bool,
  #[serde(default)]
  pub step_mode: bool,
  #[serde(default)]
  pub trace_file: String,
  #[serde(default)]
  pub stimulus_file: String,
}

impl Default for SimulationSection {
  fn default() -> Self {
    Self {
      quiet: false,
      step_mode: false,
      trace_file: String::new(),
      stimulus_file: String::new(),
    }
  }
}

/// Unified application configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct AppConfig {
  #[serde(default)]
  pub memory: DataMemConfig,
  #[serde(default)]
  pub simulation: SimulationSection,
}

/// Command line settings that win over every file and the environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
  pub quiet: bool,
  pub step: bool,
  pub trace_file: Option<String>,
  pub stimulus: Option<String>,
  pub node_id: Option<usize>,
  pub read_mode: Option<ReadMode>,
}

/// Shipped defaults, `src/simulator/config/default.toml`.
pub fn default_config_path() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("src")
    .join("simulator")
    .join("config")
    .join("default.toml")
}

pub fn load_default_config() -> io::Result<AppConfig> {
  load_config_file(&default_config_path())
}

/// Load configuration from a single TOML file
pub fn load_config_file(path: &Path) -> io::Result<AppConfig> {
  let content = fs::read_to_string(path)
    .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("cannot read config file {:?}: {}", path, e)))?;

  toml::from_str::<AppConfig>(&content)
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("failed to parse TOML config: {}", e)))
}

/// Apply CLI arguments on top of a loaded configuration
pub fn apply_cli_overrides(config: &mut AppConfig, overrides: &CliOverrides) {
  if overrides.quiet {
    config.simulation.quiet = true;
  }
  if overrides.step {
    config.simulation.step_mode = true;
  }
  if let Some(file) = &overrides.trace_file {
    config.simulation.trace_file = file.clone();
  }
  if let Some(file) = &overrides.stimulus {
    config.simulation.stimulus_file = file.clone();
  }
  if let Some(node_id) = overrides.node_id {
    config.memory.node_id = node_id;
  }
  if let Some(mode) = overrides.read_mode {
    config.memory.read_mode = mode;
  }
}

/// Validate configuration
pub fn validate_config(config: &AppConfig) -> io::Result<()> {
  config
    .memory
    .validate()
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Resolve relative paths against `root`
pub fn resolve_paths(config: &mut AppConfig, root: &Path) {
  config.simulation.trace_file = resolve_single_path(&config.simulation.trace_file, root);
  config.simulation.stimulus_file = resolve_single_path(&config.simulation.stimulus_file, root);
}

fn resolve_single_path(path_str: &str, root: &Path) -> String {
  if path_str.is_empty() || Path::new(path_str).is_absolute() {
    return path_str.to_string();
  }
  root.join(path_str).to_string_lossy().to_string()
}

/// Load and merge configuration
///
/// Layers, later wins:
/// 1. default.toml
/// 2. the custom config file, if given
/// 3. `CGRAMEM__SECTION__KEY` environment variables
/// 4. CLI overrides
///
/// Relative paths are resolved against the working directory and the result
/// is validated.
pub fn load_and_merge_configs(custom_config_path: Option<&Path>, overrides: &CliOverrides) -> io::Result<AppConfig> {
  let mut builder = ::config::Config::builder().add_source(::config::File::from(default_config_path()).required(true));

  if let Some(custom_path) = custom_config_path {
    debug!("loading config {:?}", custom_path);
    builder = builder.add_source(::config::File::from(custom_path.to_path_buf()).required(true));
  }

  builder = builder.add_source(
    ::config::Environment::with_prefix(ENV_PREFIX)
      .separator("__")
      .try_parsing(true),
  );

  let layered = builder
    .build()
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("failed to load config: {}", e)))?;
  let mut config: AppConfig = layered
    .try_deserialize()
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid config: {}", e)))?;

  apply_cli_overrides(&mut config, overrides);

  let cwd = std::env::current_dir()?;
  resolve_paths(&mut config, &cwd);

  validate_config(&config)?;

  Ok(config)
}
