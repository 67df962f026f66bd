pub mod arch;
pub mod simulator;

pub use arch::cgra::{DataMem, DataMemConfig};
pub use simulator::sim::mode::{SimConfig, StepMode};
pub use simulator::utils::log;
