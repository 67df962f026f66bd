use log::{debug, info};

use super::bank::BankArray;
use super::config::{DataMemConfig, ReadMode};
use super::error::{ConfigError, MemError};
use super::noc::NocStamp;
use super::outstanding::OutstandingLoadTable;
use super::preload::Preloader;
use super::read_path::ReadPath;
use super::router::AddressRouter;
use super::types::{Addr, Data, TickInput, TickOutput};
use super::write_path::WritePath;

/// Banked scratchpad data memory of one node.
///
/// Each call to [`DataMem::tick`] is one clock cycle: routing and arbitration
/// read the state left by the previous tick, and every update (bank writes,
/// outstanding table, gate, preload cursor) lands at the end of the call.
#[derive(Debug, Clone)]
pub struct DataMem {
  config: DataMemConfig,
  router: AddressRouter,
  stamp: NocStamp,
  banks: BankArray,
  preloader: Preloader,
  write_path: WritePath,
  read_path: ReadPath,
  cycle: u64,
}

impl DataMem {
  pub fn new(config: DataMemConfig) -> Result<Self, ConfigError> {
    config.validate()?;

    let router = AddressRouter::new(
      config.address_lower,
      config.address_upper,
      config.data_mem_size_per_bank,
      config.num_banks,
    );
    let stamp = NocStamp::new(config.node_id, config.topology_map());
    let banks = BankArray::new(config.num_banks, config.data_mem_size_per_bank);
    let preloader = Preloader::new(config.preload.clone(), config.data_mem_size_per_bank);
    let write_path = WritePath::new(config.num_wr_tiles, config.num_banks);
    let read_path = ReadPath::new(
      config.num_rd_tiles,
      config.num_banks,
      config.read_mode,
      config.pending_load_policy,
      OutstandingLoadTable::new(config.num_kernels, config.loads_per_kernel),
    );

    info!(
      "data memory node {}: {} banks x {} words, window [{:#x}, {:#x}], {:?}",
      config.node_id,
      config.num_banks,
      config.data_mem_size_per_bank,
      config.address_lower,
      config.address_upper,
      config.read_mode
    );

    Ok(Self {
      config,
      router,
      stamp,
      banks,
      preloader,
      write_path,
      read_path,
      cycle: 0,
    })
  }

  pub fn config(&self) -> &DataMemConfig {
    &self.config
  }

  pub fn read_mode(&self) -> ReadMode {
    self.read_path.mode()
  }

  /// Preload has finished and live traffic is served.
  pub fn is_ready(&self) -> bool {
    self.preloader.is_done()
  }

  /// Ticks run since construction.
  pub fn cycle(&self) -> u64 {
    self.cycle
  }

  pub fn address_window(&self) -> (Addr, Addr) {
    self.router.window()
  }

  /// Moves the local window. Takes effect from the next tick.
  pub fn set_address_window(&mut self, lower: Addr, upper: Addr) -> Result<(), ConfigError> {
    self.config.check_window(lower, upper)?;
    self.config.address_lower = lower;
    self.config.address_upper = upper;
    self.router = AddressRouter::new(lower, upper, self.config.data_mem_size_per_bank, self.config.num_banks);
    info!("data memory node {} window now [{:#x}, {:#x}]", self.config.node_id, lower, upper);
    Ok(())
  }

  pub fn bank_contents(&self, bank: usize) -> Vec<Data> {
    self.banks.contents(bank)
  }

  /// Re-enters preload and drops in-flight buffering. Bank contents survive
  /// unless the preload image overwrites them.
  pub fn reset(&mut self) {
    debug!("data memory node {} reset", self.config.node_id);
    self.preloader.reset();
    self.write_path.reset();
    self.read_path.reset(self.config.clear_outstanding_on_reset);
  }

  pub fn tick(&mut self, input: &TickInput) -> Result<TickOutput, MemError> {
    self.check_ports(input)?;
    self.read_path.check_tags(input)?;
    self.cycle += 1;

    let mut out = TickOutput::idle(self.config.num_rd_tiles, self.config.num_wr_tiles);

    if !self.preloader.is_done() {
      self.preloader.tick(&mut self.banks);
      self.banks.commit();
      out.init_done = self.preloader.is_done();
      return Ok(out);
    }
    out.init_done = true;

    // Reads see the banks as they were before this tick's writes.
    self
      .read_path
      .tick(input, &self.router, &self.stamp, &self.banks, &mut out);
    self
      .write_path
      .tick(input, &self.router, &self.stamp, &mut self.banks, &mut out);

    self.banks.commit();
    self.read_path.commit();
    Ok(out)
  }

  fn check_ports(&self, input: &TickInput) -> Result<(), MemError> {
    check_port_count("write_addr", &input.write_addr, self.config.num_wr_tiles)?;
    check_port_count("write_data", &input.write_data, self.config.num_wr_tiles)?;
    check_port_count("read_req", &input.read_req, self.config.num_rd_tiles)
  }
}

fn check_port_count<T>(kind: &'static str, ports: &[Option<T>], configured: usize) -> Result<(), MemError> {
  match ports.iter().enumerate().skip(configured).find(|(_, port)| port.is_some()) {
    Some((port, _)) => Err(MemError::PortOutOfRange { kind, port, configured }),
    None => Ok(()),
  }
}
