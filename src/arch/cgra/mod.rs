//! Banked scratchpad data memory of one CGRA node.

pub mod bank;
pub mod bypass_queue;
pub mod config;
pub mod crossbar;
pub mod data_mem;
pub mod error;
pub mod noc;
pub mod outstanding;
pub mod preload;
pub mod read_path;
pub mod router;
pub mod types;
pub mod write_path;

pub use config::{DataMemConfig, PendingLoadPolicy, ReadMode, TopologyEntry};
pub use data_mem::DataMem;
pub use error::{ConfigError, MemError};
pub use types::{
  Addr, Command, Data, EgressReady, LoadTag, NocPacket, NocPayload, NodeCoord, ReadRequest, TickInput, TickOutput,
};
