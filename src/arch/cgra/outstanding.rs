use log::{debug, trace};

use super::error::MemError;
use super::types::{Data, LoadTag};

/// Per-(kernel, load) buffer of the latest remote load result.
///
/// Clears and response writes are staged during a tick and applied by
/// `commit`; a clear lands before a response to the same entry, so a response
/// arriving on the consume tick survives.
#[derive(Debug, Clone)]
pub struct OutstandingLoadTable {
  num_kernels: usize,
  loads_per_kernel: usize,
  entries: Vec<Data>,
  clears: Vec<LoadTag>,
  responses: Vec<(LoadTag, Data)>,
}

impl OutstandingLoadTable {
  pub fn new(num_kernels: usize, loads_per_kernel: usize) -> Self {
    Self {
      num_kernels,
      loads_per_kernel,
      entries: vec![Data::default(); num_kernels * loads_per_kernel],
      clears: Vec::new(),
      responses: Vec::new(),
    }
  }

  pub fn check_tag(&self, tag: LoadTag) -> Result<(), MemError> {
    if tag.kernel_id < self.num_kernels && tag.load_id < self.loads_per_kernel {
      Ok(())
    } else {
      Err(MemError::TagOutOfRange {
        kernel_id: tag.kernel_id,
        load_id: tag.load_id,
        num_kernels: self.num_kernels,
        loads_per_kernel: self.loads_per_kernel,
      })
    }
  }

  fn index(&self, tag: LoadTag) -> usize {
    tag.kernel_id * self.loads_per_kernel + tag.load_id
  }

  /// Entry as seen at the start of the tick.
  pub fn peek(&self, tag: LoadTag) -> Data {
    self.entries.get(self.index(tag)).copied().unwrap_or_default()
  }

  /// Marks the entry consumed; its predicate drops at the tick boundary.
  pub fn schedule_clear(&mut self, tag: LoadTag) {
    self.clears.push(tag);
  }

  pub fn stage_response(&mut self, tag: LoadTag, data: Data) {
    self.responses.push((tag, data));
  }

  pub fn commit(&mut self) {
    for tag in std::mem::take(&mut self.clears) {
      let index = self.index(tag);
      if let Some(entry) = self.entries.get_mut(index) {
        trace!("outstanding ({}, {}) consumed", tag.kernel_id, tag.load_id);
        *entry = Data::default();
      }
    }
    for (tag, data) in std::mem::take(&mut self.responses) {
      let index = self.index(tag);
      if let Some(entry) = self.entries.get_mut(index) {
        debug!(
          "outstanding ({}, {}) <= {:#x} (p={})",
          tag.kernel_id, tag.load_id, data.payload, data.predicate
        );
        *entry = data;
      }
    }
  }

  pub fn clear(&mut self) {
    self.entries.iter_mut().for_each(|entry| *entry = Data::default());
    self.clears.clear();
    self.responses.clear();
  }
}

/// The remote load currently on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlightLoad {
  pub tag: LoadTag,
  /// Read port waiting on the response; blocking mode only.
  pub owner: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateUpdate {
  Arm(InFlightLoad),
  Disarm,
}

/// Single pending-remote-load flag of the node. While armed no new locally
/// initiated load request leaves the node.
#[derive(Debug, Clone, Default)]
pub struct RemoteLoadGate {
  in_flight: Option<InFlightLoad>,
  update: Option<GateUpdate>,
}

impl RemoteLoadGate {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_armed(&self) -> bool {
    self.in_flight.is_some()
  }

  pub fn in_flight(&self) -> Option<InFlightLoad> {
    self.in_flight
  }

  /// A request left the node this tick; applied at commit.
  pub fn is_arming(&self) -> bool {
    matches!(self.update, Some(GateUpdate::Arm(_)))
  }

  /// Whether `tag` is in flight or was issued this tick.
  pub fn tracks(&self, tag: LoadTag) -> bool {
    let staged = match self.update {
      Some(GateUpdate::Arm(load)) => Some(load.tag),
      _ => None,
    };
    self.in_flight.map(|load| load.tag) == Some(tag) || staged == Some(tag)
  }

  pub fn arm(&mut self, tag: LoadTag, owner: Option<usize>) {
    self.update = Some(GateUpdate::Arm(InFlightLoad { tag, owner }));
  }

  pub fn disarm(&mut self) {
    self.update = Some(GateUpdate::Disarm);
  }

  pub fn commit(&mut self) {
    match self.update.take() {
      Some(GateUpdate::Arm(load)) => {
        debug!("remote load ({}, {}) in flight", load.tag.kernel_id, load.tag.load_id);
        self.in_flight = Some(load);
      },
      Some(GateUpdate::Disarm) => {
        debug!("remote load gate released");
        self.in_flight = None;
      },
      None => {},
    }
  }

  pub fn reset(&mut self) {
    self.in_flight = None;
    self.update = None;
  }
}
