pub mod config;
pub mod sim;
pub mod simulator;
pub mod stimulus;
pub mod utils;

pub use simulator::Simulator;
pub use stimulus::{Stimulus, StimulusTick};
pub use utils::log;
