//! Global logging setup
use log::LevelFilter;

/// Installs `env_logger` once. Defaults to `info`; `RUST_LOG` overrides.
pub fn init_log() {
  let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    .format_timestamp(None)
    .try_init();
}

/// Set logging enabled. Disabling silences every level; re-enabling hands
/// filtering back to the logger.
pub fn set_log(enabled: bool) {
  log::set_max_level(if enabled { LevelFilter::Trace } else { LevelFilter::Off });
}
