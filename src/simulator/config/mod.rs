pub mod config;

pub use self::config::{load_and_merge_configs, load_config_file, AppConfig, CliOverrides, SimulationSection};
