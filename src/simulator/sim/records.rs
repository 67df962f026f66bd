//! Model records written by the data memory.
use sim::models::ModelRecord;
use sim::simulator::Services;

use crate::arch::cgra::TickOutput;

pub const TICK_ACTION: &str = "tick";
pub const RESET_ACTION: &str = "reset";

/// One clock edge; the subject is the JSON `TickOutput`.
pub fn tick_record(services: &Services, output: &TickOutput) -> serde_json::Result<ModelRecord> {
  Ok(ModelRecord {
    time: services.global_time(),
    action: TICK_ACTION.to_string(),
    subject: serde_json::to_string(output)?,
  })
}

pub fn reset_record(services: &Services, node_id: usize) -> ModelRecord {
  ModelRecord {
    time: services.global_time(),
    action: RESET_ACTION.to_string(),
    subject: format!("node {}", node_id),
  }
}

pub fn is_tick(record: &ModelRecord) -> bool {
  record.action == TICK_ACTION
}

/// Output carried by a tick record, `None` for any other record.
pub fn tick_output(record: &ModelRecord) -> Option<serde_json::Result<TickOutput>> {
  is_tick(record).then(|| serde_json::from_str::<TickOutput>(&record.subject))
}
