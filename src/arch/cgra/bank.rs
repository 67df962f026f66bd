use log::trace;

use super::types::Data;

/// One physically narrow memory: a single read and a single write port per tick.
#[derive(Debug, Clone)]
pub struct Sram {
  data: Vec<Data>,
}

impl Sram {
  fn new(depth: usize) -> Self {
    Self {
      data: vec![Data::default(); depth],
    }
  }

  fn read(&self, offset: usize) -> Data {
    self.data.get(offset).copied().unwrap_or_default()
  }

  fn write(&mut self, offset: usize, value: Data) {
    if let Some(slot) = self.data.get_mut(offset) {
      *slot = value;
    }
  }
}

#[derive(Debug, Clone, Copy)]
struct StagedWrite {
  offset: usize,
  value: Data,
}

/// Independently addressable banks. Writes are staged during a tick and land on
/// `commit`, so reads issued in the same tick observe the pre-write contents.
#[derive(Debug, Clone)]
pub struct BankArray {
  banks: Vec<Sram>,
  staged: Vec<Option<StagedWrite>>,
}

impl BankArray {
  pub fn new(num_banks: usize, depth: usize) -> Self {
    Self {
      banks: (0..num_banks).map(|_| Sram::new(depth)).collect(),
      staged: vec![None; num_banks],
    }
  }

  pub fn num_banks(&self) -> usize {
    self.banks.len()
  }

  pub fn read(&self, bank: usize, offset: usize) -> Data {
    self.banks.get(bank).map(|sram| sram.read(offset)).unwrap_or_default()
  }

  /// Drives the bank's write port for this tick. A later call in the same tick
  /// replaces the earlier one: the port takes one write per tick.
  pub fn stage_write(&mut self, bank: usize, offset: usize, value: Data) {
    if let Some(slot) = self.staged.get_mut(bank) {
      *slot = Some(StagedWrite { offset, value });
    }
  }

  pub fn is_write_staged(&self, bank: usize) -> bool {
    matches!(self.staged.get(bank), Some(Some(_)))
  }

  /// Applies the staged writes at the tick boundary.
  pub fn commit(&mut self) {
    for (bank, (sram, staged)) in self.banks.iter_mut().zip(self.staged.iter_mut()).enumerate() {
      if let Some(write) = staged.take() {
        trace!(
          "bank[{}][{}] <= {:#x} (p={})",
          bank,
          write.offset,
          write.value.payload,
          write.value.predicate
        );
        sram.write(write.offset, write.value);
      }
    }
  }

  /// Snapshot of one bank's contents.
  pub fn contents(&self, bank: usize) -> Vec<Data> {
    self.banks.get(bank).map(|sram| sram.data.clone()).unwrap_or_default()
  }
}
