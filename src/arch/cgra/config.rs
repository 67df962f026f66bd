//! Data memory configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::error::ConfigError;
use super::types::{Addr, Data, NodeCoord};

/// How tile loads to foreign addresses are completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
  /// The port stalls until the remote response comes back.
  Blocking,
  /// The port is released; the response lands in the outstanding load table.
  #[default]
  NonBlocking,
}

/// What a foreign read observes while its outstanding entry is still empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingLoadPolicy {
  /// Report valid with the empty entry; the caller must look at the predicate.
  #[default]
  Optimistic,
  /// Report nothing until the response has arrived.
  Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEntry {
  pub id: usize,
  pub x: u32,
  pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataMemConfig {
  #[serde(default = "default_size_global")]
  pub data_mem_size_global: usize,
  #[serde(default = "default_size_per_bank")]
  pub data_mem_size_per_bank: usize,
  #[serde(default = "default_num_banks")]
  pub num_banks: usize,
  #[serde(default = "default_num_tiles")]
  pub num_rd_tiles: usize,
  #[serde(default = "default_num_tiles")]
  pub num_wr_tiles: usize,
  #[serde(default)]
  pub address_lower: Addr,
  #[serde(default = "default_address_upper")]
  pub address_upper: Addr,
  #[serde(default)]
  pub node_id: usize,
  #[serde(default = "default_topology")]
  pub topology: Vec<TopologyEntry>,
  #[serde(default)]
  pub read_mode: ReadMode,
  #[serde(default)]
  pub pending_load_policy: PendingLoadPolicy,
  #[serde(default = "default_num_kernels")]
  pub num_kernels: usize,
  #[serde(default = "default_loads_per_kernel")]
  pub loads_per_kernel: usize,
  #[serde(default)]
  pub clear_outstanding_on_reset: bool,
  /// One row per bank, `data_mem_size_per_bank` words each.
  #[serde(default)]
  pub preload: Option<Vec<Vec<Data>>>,
}

fn default_size_global() -> usize {
  128
}

fn default_size_per_bank() -> usize {
  16
}

fn default_num_banks() -> usize {
  4
}

fn default_num_tiles() -> usize {
  4
}

fn default_address_upper() -> Addr {
  63
}

fn default_topology() -> Vec<TopologyEntry> {
  vec![TopologyEntry { id: 0, x: 0, y: 0 }]
}

fn default_num_kernels() -> usize {
  4
}

fn default_loads_per_kernel() -> usize {
  32
}

impl Default for DataMemConfig {
  fn default() -> Self {
    Self {
      data_mem_size_global: default_size_global(),
      data_mem_size_per_bank: default_size_per_bank(),
      num_banks: default_num_banks(),
      num_rd_tiles: default_num_tiles(),
      num_wr_tiles: default_num_tiles(),
      address_lower: 0,
      address_upper: default_address_upper(),
      node_id: 0,
      topology: default_topology(),
      read_mode: ReadMode::default(),
      pending_load_policy: PendingLoadPolicy::default(),
      num_kernels: default_num_kernels(),
      loads_per_kernel: default_loads_per_kernel(),
      clear_outstanding_on_reset: false,
      preload: None,
    }
  }
}

impl DataMemConfig {
  /// Checks every structural invariant the data memory relies on.
  pub fn validate(&self) -> Result<(), ConfigError> {
    check_power_of_two("data_mem_size_global", self.data_mem_size_global)?;
    check_power_of_two("data_mem_size_per_bank", self.data_mem_size_per_bank)?;
    check_nonzero("num_banks", self.num_banks)?;
    check_nonzero("num_rd_tiles", self.num_rd_tiles)?;
    check_nonzero("num_wr_tiles", self.num_wr_tiles)?;
    check_nonzero("num_kernels", self.num_kernels)?;
    check_nonzero("loads_per_kernel", self.loads_per_kernel)?;

    self.check_window(self.address_lower, self.address_upper)?;

    if let Some(image) = &self.preload {
      let shape_ok =
        image.len() == self.num_banks && image.iter().all(|row| row.len() == self.data_mem_size_per_bank);
      if !shape_ok {
        return Err(ConfigError::PreloadShape {
          rows: image.len(),
          lengths: image.iter().map(Vec::len).collect(),
          banks: self.num_banks,
          bank_size: self.data_mem_size_per_bank,
        });
      }
    }

    if !self.topology.iter().any(|entry| entry.id == self.node_id) {
      return Err(ConfigError::UnknownNode(self.node_id));
    }

    Ok(())
  }

  /// A window must fit in the global space and cover whole banks that exist.
  pub fn check_window(&self, lower: Addr, upper: Addr) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidWindow { lower, upper, reason };

    if lower > upper {
      return Err(invalid("lower bound above upper bound".to_string()));
    }
    if upper as u64 >= self.data_mem_size_global as u64 {
      return Err(invalid(format!(
        "upper bound outside the {}-word global space",
        self.data_mem_size_global
      )));
    }
    let span = upper as u64 - lower as u64 + 1;
    let bank_size = self.data_mem_size_per_bank as u64;
    if span % bank_size != 0 {
      return Err(invalid(format!("span {} is not a multiple of the bank size {}", span, bank_size)));
    }
    if span > bank_size * self.num_banks as u64 {
      return Err(invalid(format!(
        "span {} exceeds {} banks of {} words",
        span, self.num_banks, bank_size
      )));
    }
    Ok(())
  }

  /// Node id to fabric coordinates lookup.
  pub fn topology_map(&self) -> BTreeMap<usize, NodeCoord> {
    self
      .topology
      .iter()
      .map(|entry| (entry.id, NodeCoord { x: entry.x, y: entry.y }))
      .collect()
  }
}

fn check_power_of_two(name: &'static str, value: usize) -> Result<(), ConfigError> {
  if value.is_power_of_two() {
    Ok(())
  } else {
    Err(ConfigError::NotPowerOfTwo { name, value })
  }
}

fn check_nonzero(name: &'static str, value: usize) -> Result<(), ConfigError> {
  if value == 0 {
    Err(ConfigError::ZeroSized { name })
  } else {
    Ok(())
  }
}
