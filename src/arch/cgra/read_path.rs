use log::{debug, trace, warn};

use super::bank::BankArray;
use super::config::{PendingLoadPolicy, ReadMode};
use super::crossbar::Crossbar;
use super::error::MemError;
use super::noc::NocStamp;
use super::outstanding::{OutstandingLoadTable, RemoteLoadGate};
use super::router::{AddressRouter, Route};
use super::types::{ReadRequest, TickInput, TickOutput};

/// Tile loads plus the inbound network load, served from the banks, the
/// outstanding load table or the network.
#[derive(Debug, Clone)]
pub struct ReadPath {
  num_rd_tiles: usize,
  mode: ReadMode,
  policy: PendingLoadPolicy,
  xbar: Crossbar,
  table: OutstandingLoadTable,
  gate: RemoteLoadGate,
}

impl ReadPath {
  pub fn new(
    num_rd_tiles: usize,
    num_banks: usize,
    mode: ReadMode,
    policy: PendingLoadPolicy,
    table: OutstandingLoadTable,
  ) -> Self {
    Self {
      num_rd_tiles,
      mode,
      policy,
      xbar: Crossbar::new(num_rd_tiles + 1, num_banks + 1),
      table,
      gate: RemoteLoadGate::new(),
    }
  }

  pub fn mode(&self) -> ReadMode {
    self.mode
  }

  pub fn gate(&self) -> &RemoteLoadGate {
    &self.gate
  }

  fn noc_input(&self) -> usize {
    self.num_rd_tiles
  }

  /// Rejects tags the outstanding table cannot hold. Only the non-blocking
  /// path indexes the table.
  pub fn check_tags(&self, input: &TickInput) -> Result<(), MemError> {
    if self.mode != ReadMode::NonBlocking {
      return Ok(());
    }
    for req in input.read_req.iter().flatten() {
      self.table.check_tag(req.tag)?;
    }
    if let Some(pkt) = &input.noc_load_response {
      self.table.check_tag(pkt.payload.tag)?;
    }
    Ok(())
  }

  pub fn reset(&mut self, clear_table: bool) {
    self.xbar.reset();
    self.gate.reset();
    if clear_table {
      self.table.clear();
    }
  }

  /// Applies staged table writes and gate updates at the tick boundary.
  pub fn commit(&mut self) {
    self.table.commit();
    self.gate.commit();
  }

  pub fn tick(
    &mut self,
    input: &TickInput,
    router: &AddressRouter,
    stamp: &NocStamp,
    banks: &BankArray,
    out: &mut TickOutput,
  ) {
    let overflow = router.overflow_index();
    let owner = self.gate.in_flight().and_then(|load| load.owner);
    let blocking = self.mode == ReadMode::Blocking;

    let mut requests: Vec<Option<usize>> = (0..self.num_rd_tiles)
      .map(|tile| {
        let req = input.read_req(tile)?;
        let output = router.output_index(router.route(req.addr));
        // A blocked foreign load holds the overflow output until answered.
        if blocking && output == overflow && self.gate.is_armed() && owner != Some(tile) {
          return None;
        }
        Some(output)
      })
      .collect();
    requests.push(input.noc_load_request.as_ref().and_then(|pkt| {
      let route = router.route(pkt.payload.addr);
      let egress_ready = match route {
        Route::Bank { .. } => input.egress_ready.load_response,
        Route::Overflow => input.egress_ready.load_request,
      };
      egress_ready.then(|| router.output_index(route))
    }));

    let ready = vec![true; overflow + 1];
    let grants = self.xbar.arbitrate(&requests, &ready);

    let mut response_taken = false;
    for (src, _) in grants.grants() {
      if src == self.noc_input() {
        self.serve_remote(input, router, stamp, banks, out);
        continue;
      }
      let Some(req) = input.read_req(src) else {
        continue;
      };
      match router.route(req.addr) {
        Route::Bank { index, offset } => {
          let data = banks.read(index, offset);
          trace!("read port {} <- bank {}[{}] = {:#x}", src, index, offset, data.payload);
          out.read_data[src] = Some(data);
          out.read_accepted[src] = true;
        },
        Route::Overflow => match self.mode {
          ReadMode::NonBlocking => self.foreign_non_blocking(src, req, input, stamp, out),
          ReadMode::Blocking => response_taken |= self.foreign_blocking(src, req, input, stamp, out),
        },
      }
    }

    if let Some(pkt) = &input.noc_load_response {
      match self.mode {
        ReadMode::NonBlocking => {
          out.noc_load_response_accepted = true;
          let tag = pkt.payload.tag;
          self.table.stage_response(tag, pkt.payload.data);
          // Also covers a response landing on the tick its request left.
          if self.gate.tracks(tag) {
            self.gate.disarm();
          }
        },
        ReadMode::Blocking if !response_taken && !self.gate.is_armed() && !self.gate.is_arming() => {
          warn!(
            "dropping load response for {:#x}: no remote load in flight",
            pkt.payload.addr
          );
          out.noc_load_response_accepted = true;
        },
        ReadMode::Blocking => {},
      }
    }
  }

  /// Network-origin load: answer from a bank or relay it onward.
  fn serve_remote(
    &mut self,
    input: &TickInput,
    router: &AddressRouter,
    stamp: &NocStamp,
    banks: &BankArray,
    out: &mut TickOutput,
  ) {
    let Some(pkt) = &input.noc_load_request else {
      return;
    };
    out.noc_load_request_accepted = true;
    match router.route(pkt.payload.addr) {
      Route::Bank { index, offset } => {
        let data = banks.read(index, offset);
        debug!(
          "remote load {:#x} from node {} tile {} = {:#x}",
          pkt.payload.addr, pkt.src, pkt.src_tile, data.payload
        );
        out.send_load_response = Some(stamp.load_response(pkt, data));
      },
      Route::Overflow => {
        debug!("relaying remote load {:#x} from node {}", pkt.payload.addr, pkt.src);
        out.send_load_request = Some(*pkt);
      },
    }
  }

  fn foreign_non_blocking(
    &mut self,
    tile: usize,
    req: ReadRequest,
    input: &TickInput,
    stamp: &NocStamp,
    out: &mut TickOutput,
  ) {
    out.read_accepted[tile] = true;
    let entry = self.table.peek(req.tag);
    if entry.predicate {
      debug!(
        "read port {} resolved ({}, {}) = {:#x}",
        tile, req.tag.kernel_id, req.tag.load_id, entry.payload
      );
      out.read_data[tile] = Some(entry);
      self.table.schedule_clear(req.tag);
      if self.gate.in_flight().map(|load| load.tag) == Some(req.tag) {
        self.gate.disarm();
      }
      return;
    }

    if !self.gate.is_armed() && input.egress_ready.load_request {
      debug!(
        "read port {} issues remote load {:#x} ({}, {})",
        tile, req.addr, req.tag.kernel_id, req.tag.load_id
      );
      out.send_load_request = Some(stamp.load_request(tile, req.addr, req.tag));
      self.gate.arm(req.tag, None);
    }
    out.read_data[tile] = match self.policy {
      PendingLoadPolicy::Optimistic => Some(entry),
      PendingLoadPolicy::Strict => None,
    };
  }

  /// Returns whether the inbound response was consumed.
  fn foreign_blocking(
    &mut self,
    tile: usize,
    req: ReadRequest,
    input: &TickInput,
    stamp: &NocStamp,
    out: &mut TickOutput,
  ) -> bool {
    if self.gate.is_armed() {
      // Only the owner reaches the overflow output while armed.
      let Some(pkt) = &input.noc_load_response else {
        return false;
      };
      debug!("read port {} receives remote load {:#x}", tile, req.addr);
      out.read_data[tile] = Some(pkt.payload.data);
      out.read_accepted[tile] = true;
      out.noc_load_response_accepted = true;
      self.gate.disarm();
      return true;
    }

    if input.egress_ready.load_request {
      debug!("read port {} blocks on remote load {:#x}", tile, req.addr);
      out.send_load_request = Some(stamp.load_request(tile, req.addr, req.tag));
      self.gate.arm(req.tag, Some(tile));
    }
    false
  }
}
