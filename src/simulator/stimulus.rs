use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::arch::cgra::TickInput;

/// One clock edge worth of input. `reset` is applied before the edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StimulusTick {
  #[serde(default)]
  pub reset: bool,
  #[serde(flatten)]
  pub input: TickInput,
}

impl StimulusTick {
  pub fn new(input: TickInput) -> Self {
    Self { reset: false, input }
  }

  pub fn reset() -> Self {
    Self {
      reset: true,
      input: TickInput::default(),
    }
  }
}

impl From<TickInput> for StimulusTick {
  fn from(input: TickInput) -> Self {
    Self::new(input)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
  #[serde(default)]
  pub ticks: Vec<StimulusTick>,
}

impl Stimulus {
  pub fn from_json(content: &str) -> io::Result<Self> {
    serde_json::from_str(content)
      .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("failed to parse stimulus: {}", e)))
  }

  pub fn from_file(path: &Path) -> io::Result<Self> {
    let content = fs::read_to_string(path)
      .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("cannot read stimulus {:?}: {}", path, e)))?;
    Self::from_json(&content)
  }

  pub fn len(&self) -> usize {
    self.ticks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ticks.is_empty()
  }
}
