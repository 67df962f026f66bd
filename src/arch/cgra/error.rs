use thiserror::Error;

use super::types::Addr;

/// Rejected data memory configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("{name} must be a power of two, got {value}")]
  NotPowerOfTwo { name: &'static str, value: usize },

  #[error("{name} must be at least 1")]
  ZeroSized { name: &'static str },

  #[error("address window [{lower:#x}, {upper:#x}] is invalid: {reason}")]
  InvalidWindow { lower: Addr, upper: Addr, reason: String },

  #[error("preload image has {rows} rows of lengths {lengths:?}, expected {banks} rows of {bank_size}")]
  PreloadShape {
    rows: usize,
    lengths: Vec<usize>,
    banks: usize,
    bank_size: usize,
  },

  #[error("node {0} has no coordinates in the topology table")]
  UnknownNode(usize),
}

/// Per-tick failure of the data memory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemError {
  #[error(
    "load tag (kernel {kernel_id}, load {load_id}) is outside the outstanding table ({num_kernels} kernels x {loads_per_kernel} loads)"
  )]
  TagOutOfRange {
    kernel_id: usize,
    load_id: usize,
    num_kernels: usize,
    loads_per_kernel: usize,
  },

  #[error("{kind} port {port} presented, only {configured} configured")]
  PortOutOfRange {
    kind: &'static str,
    port: usize,
    configured: usize,
  },
}
