use log::{debug, error, LevelFilter};
use sim::models::model_trait::{DevsModel, Reportable, ReportableModel, SerializableModel};
use sim::models::{ModelMessage, ModelRecord};
use sim::simulator::{Services, Simulation};
use sim::utils::errors::SimulationError;
use std::collections::VecDeque;
use std::f64::INFINITY;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::arch::cgra::{DataMem, TickInput};
use super::records::{reset_record, tick_record};

/// Id of the data memory inside the simulation.
pub const DATA_MEM_ID: &str = "data_mem";
/// Accepts a JSON `TickInput`; each one schedules a clock edge.
pub const STIMULUS_PORT: &str = "stimulus";
/// Any content resets the memory before the next edge.
pub const RESET_PORT: &str = "reset";
/// Carries the JSON `TickOutput` of every edge.
pub const OUTPUT_PORT: &str = "tick_output";

/// Clock period in simulation time units.
const CLOCK_PERIOD: f64 = 1.0;

/// `DataMem` as a DEVS model.
#[derive(Debug, Clone)]
pub struct DataMemModel {
  mem: DataMem,
  pending: VecDeque<TickInput>,
  until_next_event: f64,
  records: Vec<ModelRecord>,
}

impl DataMemModel {
  pub fn new(mem: DataMem) -> Self {
    Self {
      mem,
      pending: VecDeque::new(),
      until_next_event: INFINITY,
      records: Vec::new(),
    }
  }

  pub fn mem(&self) -> &DataMem {
    &self.mem
  }
}

impl DevsModel for DataMemModel {
  fn events_ext(&mut self, incoming_message: &ModelMessage, services: &mut Services) -> Result<(), SimulationError> {
    match incoming_message.port_name.as_str() {
      STIMULUS_PORT => {
        let input = serde_json::from_str::<TickInput>(&incoming_message.content).map_err(|e| {
          error!("bad stimulus {:?}: {}", incoming_message.content, e);
          SimulationError::InvalidModelState
        })?;
        self.pending.push_back(input);
        if self.until_next_event == INFINITY {
          self.until_next_event = CLOCK_PERIOD;
        }
      },
      RESET_PORT => {
        self.mem.reset();
        self.records.push(reset_record(services, self.mem.config().node_id));
      },
      other => debug!("data memory ignores port {}", other),
    }
    Ok(())
  }

  fn events_int(&mut self, services: &mut Services) -> Result<Vec<ModelMessage>, SimulationError> {
    let mut messages = Vec::new();

    if let Some(input) = self.pending.pop_front() {
      let output = self.mem.tick(&input).map_err(|e| {
        error!("cycle {}: {}", self.mem.cycle(), e);
        SimulationError::InvalidModelState
      })?;
      let record = tick_record(services, &output).map_err(|e| {
        error!("cannot encode tick output: {}", e);
        SimulationError::InvalidModelState
      })?;
      messages.push(ModelMessage {
        port_name: OUTPUT_PORT.to_string(),
        content: record.subject.clone(),
      });
      self.records.push(record);
    }

    self.until_next_event = if self.pending.is_empty() {
      INFINITY
    } else {
      CLOCK_PERIOD
    };
    Ok(messages)
  }

  fn time_advance(&mut self, time_delta: f64) {
    self.until_next_event -= time_delta;
  }

  fn until_next_event(&self) -> f64 {
    self.until_next_event
  }
}

impl Reportable for DataMemModel {
  fn status(&self) -> String {
    format!(
      "cycle={} ready={} pending={}",
      self.mem.cycle(),
      self.mem.is_ready(),
      self.pending.len()
    )
  }

  fn records(&self) -> &Vec<ModelRecord> {
    &self.records
  }
}

impl ReportableModel for DataMemModel {}

impl SerializableModel for DataMemModel {
  fn get_type(&self) -> &'static str {
    "DataMem"
  }
}

/// Delivers pending messages, then advances until simulation time moves.
pub fn model_step(simulation: &mut Simulation, trace_writer: &mut Option<BufWriter<File>>) -> io::Result<()> {
  let mut messages_to_process = simulation.get_messages().to_vec();

  while !messages_to_process.is_empty() {
    if log::max_level() >= LevelFilter::Debug {
      for msg in messages_to_process.iter() {
        debug!(
          "[MSG] t={:.1} {}:{} -> {}:{} | {}",
          msg.time(),
          msg.source_id(),
          msg.source_port(),
          msg.target_id(),
          msg.target_port(),
          msg.content()
        );
      }
    }

    if let Some(writer) = trace_writer {
      for msg in messages_to_process.iter() {
        let trace_entry = serde_json::json!({
          "kind": "message",
          "time": msg.time(),
          "source": msg.source_id(),
          "source_port": msg.source_port(),
          "target": msg.target_id(),
          "target_port": msg.target_port(),
          "content": msg.content()
        });
        writeln!(writer, "{}", trace_entry)?;
      }
      writer.flush()?;
    }

    let time0 = simulation.get_global_time();
    simulation.step().map_err(step_error)?;
    if simulation.get_global_time() > time0 {
      break;
    }

    messages_to_process = simulation.get_messages().to_vec();
  }

  // Internal events: stop once time advances or every model is passive.
  loop {
    let until_next_event = simulation
      .models()
      .iter()
      .fold(INFINITY, |min, model| f64::min(min, model.until_next_event()));

    if until_next_event == INFINITY {
      break;
    }

    let time0 = simulation.get_global_time();
    simulation.step().map_err(step_error)?;
    if simulation.get_global_time() > time0 {
      break;
    }
  }

  Ok(())
}

fn step_error(e: SimulationError) -> io::Error {
  error!("simulation step error: {:?}", e);
  io::Error::new(io::ErrorKind::Other, format!("simulation error: {:?}", e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arch::cgra::DataMemConfig;
  use crate::simulator::sim::records::is_tick;
  use sim::models::Model;

  fn simulation() -> Simulation {
    let mem = DataMem::new(DataMemConfig::default()).expect("default config");
    let models = vec![Model::new(DATA_MEM_ID.to_string(), Box::new(DataMemModel::new(mem)))];
    Simulation::post(models, Vec::new())
  }

  fn tick_records(simulation: &mut Simulation) -> usize {
    simulation
      .models()
      .iter()
      .map(|model| model.records().iter().filter(|r| is_tick(r)).count())
      .sum()
  }

  #[test]
  fn test_one_stimulus_one_edge() {
    let mut simulation = simulation();
    let mut trace = None;
    let content = serde_json::to_string(&TickInput::default()).unwrap();
    crate::simulator::sim::inject::inject_message(&mut simulation, DATA_MEM_ID, STIMULUS_PORT, &content);
    model_step(&mut simulation, &mut trace).unwrap();
    assert_eq!(tick_records(&mut simulation), 1);
    assert_eq!(simulation.get_global_time(), CLOCK_PERIOD);
  }

  #[test]
  fn test_bad_stimulus_is_an_error() {
    let mut simulation = simulation();
    let mut trace = None;
    crate::simulator::sim::inject::inject_message(&mut simulation, DATA_MEM_ID, STIMULUS_PORT, "not json");
    assert!(model_step(&mut simulation, &mut trace).is_err());
  }
}
