use log::{info, warn};
use sim::models::{Model, Reportable};
use sim::simulator::Simulation;
use std::fs::File;
use std::io::{self, BufWriter, Result, Write};

use super::config::AppConfig;
use super::sim::inject::inject_message;
use super::sim::mode::{SimConfig, StepMode};
use super::sim::model::{model_step, DataMemModel, DATA_MEM_ID, RESET_PORT, STIMULUS_PORT};
use super::sim::records::tick_output;
use super::sim::shell::{Command, Shell};
use super::stimulus::{Stimulus, StimulusTick};
use super::utils::log::set_log;
use super::utils::report::print_simulation_records;
use crate::arch::cgra::{DataMem, DataMemConfig, TickInput, TickOutput};

/// Drives one data memory through the `sim` engine, one clock edge per
/// stimulus tick.
pub struct Simulator {
  config: SimConfig,
  simulation: Simulation,
  trace_writer: Option<BufWriter<File>>,
  warmup_limit: usize,
  consumed_records: usize,
  outputs: Vec<TickOutput>,
}

impl Simulator {
  pub fn new(mem_config: DataMemConfig, config: SimConfig) -> Result<Self> {
    if config.quiet {
      set_log(false);
    }

    let warmup_limit = mem_config.data_mem_size_per_bank + 1;
    let mem = DataMem::new(mem_config).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let models = vec![Model::new(DATA_MEM_ID.to_string(), Box::new(DataMemModel::new(mem)))];
    let simulation = Simulation::post(models, Vec::new());

    let trace_writer = match &config.trace_file {
      Some(path) if !path.is_empty() => {
        info!("writing trace to {}", path);
        Some(BufWriter::new(File::create(path)?))
      },
      _ => None,
    };

    Ok(Self {
      config,
      simulation,
      trace_writer,
      warmup_limit,
      consumed_records: 0,
      outputs: Vec::new(),
    })
  }

  pub fn from_app_config(app_config: &AppConfig) -> Result<Self> {
    let section = &app_config.simulation;
    let config = SimConfig {
      quiet: section.quiet,
      step_mode: if section.step_mode {
        StepMode::Step
      } else {
        StepMode::Continuous
      },
      trace_file: (!section.trace_file.is_empty()).then(|| section.trace_file.clone()),
    };
    Self::new(app_config.memory.clone(), config)
  }

  pub fn global_time(&self) -> f64 {
    self.simulation.get_global_time()
  }

  /// Every tick output so far, warm-up included.
  pub fn outputs(&self) -> &[TickOutput] {
    &self.outputs
  }

  /// Runs idle ticks until preload reports done. Returns the ticks spent.
  pub fn warm_up(&mut self) -> Result<usize> {
    for spent in 1..=self.warmup_limit {
      if self.step(&StimulusTick::default())?.init_done {
        info!("preload finished after {} ticks", spent);
        return Ok(spent);
      }
    }
    Err(io::Error::new(
      io::ErrorKind::TimedOut,
      format!("preload not finished after {} ticks", self.warmup_limit),
    ))
  }

  /// One clock edge.
  pub fn step(&mut self, tick: &StimulusTick) -> Result<TickOutput> {
    if tick.reset {
      inject_message(&mut self.simulation, DATA_MEM_ID, RESET_PORT, "1");
    }
    let content = serde_json::to_string(&tick.input)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("cannot encode stimulus: {}", e)))?;
    inject_message(&mut self.simulation, DATA_MEM_ID, STIMULUS_PORT, &content);
    model_step(&mut self.simulation, &mut self.trace_writer)?;

    let mut produced = self.collect_outputs()?;
    let output = match produced.len() {
      1 => produced.remove(0),
      n => {
        return Err(io::Error::new(
          io::ErrorKind::Other,
          format!("expected one tick output, got {}", n),
        ))
      },
    };

    if let Some(writer) = &mut self.trace_writer {
      let trace_entry = serde_json::json!({
        "kind": "tick",
        "time": self.simulation.get_global_time(),
        "cycle": self.outputs.len(),
        "input": tick,
        "output": output,
      });
      writeln!(writer, "{}", trace_entry)?;
      writer.flush()?;
    }

    self.outputs.push(output.clone());
    Ok(output)
  }

  pub fn step_input(&mut self, input: TickInput) -> Result<TickOutput> {
    self.step(&StimulusTick::new(input))
  }

  /// Warms up, then plays `stimulus` either straight through or under the
  /// interactive shell. Returns the outputs of the stimulus ticks.
  pub fn run(&mut self, stimulus: &Stimulus) -> Result<Vec<TickOutput>> {
    self.warm_up()?;
    let first = self.outputs.len();

    match self.config.step_mode {
      StepMode::Continuous => {
        for tick in &stimulus.ticks {
          self.step(tick)?;
        }
      },
      StepMode::Step => self.run_step_mode(stimulus)?,
    }

    if !self.config.quiet {
      print_simulation_records(&mut self.simulation);
    }
    Ok(self.outputs[first..].to_vec())
  }

  fn run_step_mode(&mut self, stimulus: &Stimulus) -> Result<()> {
    println!("Step mode: {} ticks queued", stimulus.len());
    let mut shell = Shell::new()?;
    let mut ticks = stimulus.ticks.iter();

    loop {
      let count = match shell.read_command()? {
        Command::Quit => break,
        Command::Continue => u32::MAX,
        Command::Step(n) => n,
      };
      for _ in 0..count {
        let Some(tick) = ticks.next() else {
          println!("Stimulus exhausted");
          return Ok(());
        };
        let output = self.step(tick)?;
        println!("{}", serde_json::to_string(&output).unwrap_or_default());
      }
    }
    Ok(())
  }

  fn collect_outputs(&mut self) -> Result<Vec<TickOutput>> {
    let mut outputs = Vec::new();
    let mut seen = 0;
    for model in self.simulation.models().iter() {
      if model.id() != DATA_MEM_ID {
        continue;
      }
      let records = model.records();
      seen = records.len();
      for record in records.iter().skip(self.consumed_records) {
        let Some(output) = tick_output(record) else {
          continue;
        };
        let output = output.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("bad tick record: {}", e)))?;
        outputs.push(output);
      }
    }
    if seen == self.consumed_records {
      warn!("no records at t={:.1}", self.simulation.get_global_time());
    }
    self.consumed_records = seen;
    Ok(outputs)
  }
}
