use sim::models::{Model, Reportable};
use sim::simulator::Simulation;

use crate::simulator::sim::records::is_tick;

pub fn print_simulation_records(simulation: &mut Simulation) {
  println!("\n--- Simulation Records ---");

  for model in simulation.models().iter() {
    print_model_records(model, false);
  }

  println!("--- End Records ---\n");
}

/// Prints the non-tick records of a model; `verbose` also dumps every tick output.
pub fn print_model_records(model: &Model, verbose: bool) {
  let records = model.records();
  if records.is_empty() {
    return;
  }

  let ticks = records.iter().filter(|record| is_tick(record)).count();
  println!("\n[{}] {} ticks, status: {}", model.id(), ticks, model.status());
  for record in records {
    if !is_tick(record) || verbose {
      println!("  Time {:.1}: {} {}", record.time, record.action, record.subject);
    }
  }
}
