use super::types::Addr;

/// Where an address lands relative to this node's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  Bank { index: usize, offset: usize },
  /// Outside the window; forwarded to the network.
  Overflow,
}

/// Maps node-global addresses onto local banks.
///
/// Bank selection is `(addr - lower) >> log2(bank_size)`; the window is
/// validated against the bank geometry before a router is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRouter {
  lower: Addr,
  upper: Addr,
  bank_shift: u32,
  offset_mask: u32,
  num_banks: usize,
}

impl AddressRouter {
  pub fn new(lower: Addr, upper: Addr, bank_size: usize, num_banks: usize) -> Self {
    debug_assert!(bank_size.is_power_of_two());
    Self {
      lower,
      upper,
      bank_shift: bank_size.trailing_zeros(),
      offset_mask: (bank_size - 1) as u32,
      num_banks,
    }
  }

  pub fn window(&self) -> (Addr, Addr) {
    (self.lower, self.upper)
  }

  pub fn in_window(&self, addr: Addr) -> bool {
    addr >= self.lower && addr <= self.upper
  }

  pub fn route(&self, addr: Addr) -> Route {
    if !self.in_window(addr) {
      return Route::Overflow;
    }
    let local = addr - self.lower;
    Route::Bank {
      index: (local >> self.bank_shift) as usize,
      offset: (local & self.offset_mask) as usize,
    }
  }

  /// Crossbar output index of a route; overflow sits after the banks.
  pub fn output_index(&self, route: Route) -> usize {
    match route {
      Route::Bank { index, .. } => index,
      Route::Overflow => self.num_banks,
    }
  }

  pub fn overflow_index(&self) -> usize {
    self.num_banks
  }
}
