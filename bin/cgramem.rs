/// cgramem - cycle model of a CGRA node's banked data memory
use cgramem::arch::cgra::ReadMode;
use cgramem::simulator::config::{load_and_merge_configs, CliOverrides};
use cgramem::simulator::utils::log::init_log;
use cgramem::simulator::{Simulator, Stimulus};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReadModeArg {
  Blocking,
  NonBlocking,
}

impl From<ReadModeArg> for ReadMode {
  fn from(arg: ReadModeArg) -> Self {
    match arg {
      ReadModeArg::Blocking => ReadMode::Blocking,
      ReadModeArg::NonBlocking => ReadMode::NonBlocking,
    }
  }
}

#[derive(Parser, Debug)]
#[command(name = "cgramem")]
#[command(version = "0.1.0")]
#[command(about = "Cycle model of a CGRA node's banked scratchpad data memory", long_about = None)]
struct Args {
  /// Configuration file layered over the shipped defaults
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Stimulus file (JSON)
  #[arg(long, value_name = "FILE")]
  stimulus: Option<String>,

  /// Output trace file path (JSON lines)
  #[arg(long, value_name = "FILE")]
  trace_file: Option<String>,

  /// Quiet mode (suppress log messages)
  #[arg(short, long)]
  quiet: bool,

  /// Enable step mode (interactive stepping)
  #[arg(short, long)]
  step: bool,

  /// Id of this node in the topology table
  #[arg(long, value_name = "ID")]
  node_id: Option<usize>,

  /// How loads outside the local window complete
  #[arg(long, value_enum)]
  read_mode: Option<ReadModeArg>,
}

fn main() -> std::io::Result<()> {
  init_log();

  let args = Args::parse();

  let overrides = CliOverrides {
    quiet: args.quiet,
    step: args.step,
    trace_file: args.trace_file,
    stimulus: args.stimulus,
    node_id: args.node_id,
    read_mode: args.read_mode.map(ReadMode::from),
  };
  let app_config = load_and_merge_configs(args.config.as_deref(), &overrides)?;

  let stimulus = if app_config.simulation.stimulus_file.is_empty() {
    Stimulus::default()
  } else {
    Stimulus::from_file(Path::new(&app_config.simulation.stimulus_file))?
  };

  let mut simulator = Simulator::from_app_config(&app_config)?;
  let outputs = simulator.run(&stimulus)?;
  info!("ran {} stimulus ticks at t={:.1}", outputs.len(), simulator.global_time());

  if !app_config.simulation.quiet {
    for (cycle, output) in outputs.iter().enumerate() {
      println!(
        "{:>4}: {}",
        cycle,
        serde_json::to_string(output).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?
      );
    }
  }
  Ok(())
}
