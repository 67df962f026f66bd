use log::{debug, trace};

use super::bank::BankArray;
use super::bypass_queue::BypassQueue;
use super::crossbar::Crossbar;
use super::noc::NocStamp;
use super::router::{AddressRouter, Route};
use super::types::{Addr, Data, TickInput, TickOutput};

/// Tile stores plus the inbound network store, merged onto the bank write
/// ports and store egress.
#[derive(Debug, Clone)]
pub struct WritePath {
  num_wr_tiles: usize,
  data_queues: Vec<BypassQueue<Data>>,
  xbar: Crossbar,
}

impl WritePath {
  pub fn new(num_wr_tiles: usize, num_banks: usize) -> Self {
    Self {
      num_wr_tiles,
      data_queues: (0..num_wr_tiles).map(|_| BypassQueue::new()).collect(),
      // Last input is the network store port, last output is overflow.
      xbar: Crossbar::new(num_wr_tiles + 1, num_banks + 1),
    }
  }

  fn noc_input(&self) -> usize {
    self.num_wr_tiles
  }

  pub fn reset(&mut self) {
    self.data_queues.iter_mut().for_each(BypassQueue::clear);
    self.xbar.reset();
  }

  /// Word buffered for a tile that has not won its address yet.
  pub fn buffered(&self, tile: usize) -> Option<Data> {
    self.data_queues.get(tile).and_then(BypassQueue::peek)
  }

  /// Runs one tick. Bank writes are staged on `banks`; accept flags and the
  /// store egress packet go to `out`.
  pub fn tick(
    &mut self,
    input: &TickInput,
    router: &AddressRouter,
    stamp: &NocStamp,
    banks: &mut BankArray,
    out: &mut TickOutput,
  ) {
    // Data sub-channels: ready only if the queue was empty at tick start.
    for (tile, queue) in self.data_queues.iter_mut().enumerate() {
      if let Some(data) = input.write_data(tile) {
        out.write_data_accepted[tile] = queue.enq(data);
      }
    }

    let mut requests: Vec<Option<usize>> = (0..self.num_wr_tiles)
      .map(|tile| match (input.write_addr(tile), self.data_queues[tile].peek()) {
        (Some(addr), Some(_)) => Some(router.output_index(router.route(addr))),
        _ => None,
      })
      .collect();
    requests.push(
      input
        .noc_store_request
        .as_ref()
        .map(|pkt| router.output_index(router.route(pkt.payload.addr))),
    );

    let mut ready = vec![true; router.overflow_index()];
    ready.push(input.egress_ready.store);

    let grants = self.xbar.arbitrate(&requests, &ready);

    for (src, _) in grants.grants() {
      let Some((addr, data)) = self.take_granted(src, input) else {
        continue;
      };
      if src == self.noc_input() {
        out.noc_store_request_accepted = true;
      } else {
        out.write_addr_accepted[src] = true;
      }

      match router.route(addr) {
        Route::Bank { index, offset } => {
          trace!("store port {} -> bank {}[{}] = {:#x}", src, index, offset, data.payload);
          banks.stage_write(index, offset, data);
        },
        Route::Overflow => {
          debug!("store port {} forwards {:#x} to the network", src, addr);
          out.send_store = Some(stamp.store_request(addr, data));
        },
      }
    }
  }

  fn take_granted(&mut self, src: usize, input: &TickInput) -> Option<(Addr, Data)> {
    if src == self.noc_input() {
      return input
        .noc_store_request
        .as_ref()
        .map(|pkt| (pkt.payload.addr, pkt.payload.data));
    }
    let addr = input.write_addr(src)?;
    let data = self.data_queues.get_mut(src)?.deq()?;
    Some((addr, data))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::arch::cgra::types::{Command, NocPacket, NodeCoord};

  struct Fixture {
    path: WritePath,
    router: AddressRouter,
    stamp: NocStamp,
    banks: BankArray,
  }

  impl Fixture {
    fn new() -> Self {
      Self {
        path: WritePath::new(2, 2),
        router: AddressRouter::new(0, 31, 16, 2),
        stamp: NocStamp::new(0, [(0, NodeCoord::default())].into_iter().collect()),
        banks: BankArray::new(2, 16),
      }
    }

    fn tick(&mut self, input: &TickInput) -> TickOutput {
      let mut out = TickOutput::idle(2, 2);
      self
        .path
        .tick(input, &self.router, &self.stamp, &mut self.banks, &mut out);
      self.banks.commit();
      out
    }
  }

  #[test]
  fn test_local_store_lands_in_bank() {
    let mut fx = Fixture::new();
    let out = fx.tick(&TickInput::default().with_store(0, 2, Data::valid(0xa80)));
    assert_eq!(out.write_addr_accepted, vec![true, false]);
    assert_eq!(out.write_data_accepted, vec![true, false]);
    assert_eq!(fx.banks.read(0, 2), Data::valid(0xa80));
    assert!(out.send_store.is_none());
  }

  #[test]
  fn test_foreign_store_goes_to_egress() {
    let mut fx = Fixture::new();
    let out = fx.tick(&TickInput::default().with_store(1, 45, Data::valid(0xd545)));
    let pkt = out.send_store.expect("store egress");
    assert_eq!(pkt.payload.cmd, Command::StoreRequest);
    assert_eq!(pkt.payload.addr, 45);
    assert_eq!(pkt.payload.data, Data::valid(0xd545));
  }

  #[test]
  fn test_bank_conflict_holds_loser_data() {
    let mut fx = Fixture::new();
    let input = TickInput::default()
      .with_store(0, 3, Data::valid(1))
      .with_store(1, 4, Data::valid(2));
    let out = fx.tick(&input);
    assert_eq!(out.write_addr_accepted, vec![true, false]);
    assert_eq!(out.write_data_accepted, vec![true, true]);
    assert_eq!(fx.path.buffered(1), Some(Data::valid(2)));

    // The loser re-presents; its buffered data is not re-accepted.
    let out = fx.tick(&TickInput::default().with_store(1, 4, Data::valid(2)));
    assert_eq!(out.write_addr_accepted, vec![false, true]);
    assert_eq!(out.write_data_accepted, vec![false, false]);
    assert_eq!(fx.banks.read(0, 3), Data::valid(1));
    assert_eq!(fx.banks.read(0, 4), Data::valid(2));
  }

  #[test]
  fn test_address_without_data_is_not_eligible() {
    let mut fx = Fixture::new();
    let out = fx.tick(&TickInput::default().with_write_addr(0, 5));
    assert_eq!(out.write_addr_accepted, vec![false, false]);
    let out = fx.tick(&TickInput::default().with_write_data(0, Data::valid(3)));
    assert_eq!(out.write_data_accepted, vec![true, false]);
    let out = fx.tick(&TickInput::default().with_write_addr(0, 5));
    assert_eq!(out.write_addr_accepted, vec![true, false]);
    assert_eq!(fx.banks.read(0, 5), Data::valid(3));
  }

  #[test]
  fn test_overflow_waits_for_store_egress() {
    let mut fx = Fixture::new();
    let mut input = TickInput::default().with_store(0, 40, Data::valid(0xd040));
    input.egress_ready.store = false;
    let out = fx.tick(&input);
    assert_eq!(out.write_addr_accepted, vec![false, false]);
    assert!(out.send_store.is_none());
  }

  #[test]
  fn test_noc_store_accepted_when_granted() {
    let mut fx = Fixture::new();
    let out = fx.tick(&TickInput::default().with_noc_store(NocPacket::store_request(1, 17, Data::valid(0x55))));
    assert!(out.noc_store_request_accepted);
    assert_eq!(fx.banks.read(1, 1), Data::valid(0x55));

    // Competing with a tile for the same bank.
    let input = TickInput::default()
      .with_store(0, 18, Data::valid(0x66))
      .with_noc_store(NocPacket::store_request(1, 19, Data::valid(0x77)));
    let out = fx.tick(&input);
    assert!(out.write_addr_accepted[0] ^ out.noc_store_request_accepted);
  }
}
