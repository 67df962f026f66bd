use sim::simulator::{Message, Simulation};

/// Source id stamped on everything the driver injects.
pub const HOST_ID: &str = "host";

/// Injects `content` into `target_port` of `target_model` at the current
/// simulation time.
pub fn inject_message(simulation: &mut Simulation, target_model: &str, target_port: &str, content: &str) {
  let msg = Message::new(
    HOST_ID.to_string(),
    "stimulus".to_string(),
    target_model.to_string(),
    target_port.to_string(),
    simulation.get_global_time(),
    content.to_string(),
  );
  simulation.inject_input(msg);
}
