use serde::{Deserialize, Serialize};

/// Node-global data address.
pub type Addr = u32;

/// A data word together with its validity bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
  pub payload: u32,
  #[serde(default)]
  pub predicate: bool,
}

impl Data {
  pub fn new(payload: u32, predicate: bool) -> Self {
    Self { payload, predicate }
  }

  /// A live word (predicate set).
  pub fn valid(payload: u32) -> Self {
    Self::new(payload, true)
  }
}

/// Software-visible tag of a logical load operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTag {
  pub kernel_id: usize,
  pub load_id: usize,
}

impl LoadTag {
  pub fn new(kernel_id: usize, load_id: usize) -> Self {
    Self { kernel_id, load_id }
  }
}

/// Load request presented by a tile read port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRequest {
  pub addr: Addr,
  #[serde(default)]
  pub tag: LoadTag,
}

impl ReadRequest {
  pub fn new(addr: Addr) -> Self {
    Self {
      addr,
      tag: LoadTag::default(),
    }
  }

  pub fn tagged(addr: Addr, kernel_id: usize, load_id: usize) -> Self {
    Self {
      addr,
      tag: LoadTag::new(kernel_id, load_id),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCoord {
  pub x: u32,
  pub y: u32,
}

/// Command carried by an inter-node packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
  #[default]
  StoreRequest,
  LoadRequest,
  LoadResponse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NocPayload {
  pub cmd: Command,
  #[serde(default)]
  pub data: Data,
  #[serde(default)]
  pub addr: Addr,
  #[serde(default)]
  pub tag: LoadTag,
}

/// Inter-node packet. Only the fields the data memory reads or stamps are modelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NocPacket {
  #[serde(default)]
  pub src: usize,
  #[serde(default)]
  pub dst: usize,
  #[serde(default)]
  pub src_x: u32,
  #[serde(default)]
  pub src_y: u32,
  #[serde(default)]
  pub dst_x: u32,
  #[serde(default)]
  pub dst_y: u32,
  #[serde(default)]
  pub src_tile: usize,
  #[serde(default)]
  pub dst_tile: usize,
  pub payload: NocPayload,
}

impl NocPacket {
  /// Inbound store request as a remote node would send it.
  pub fn store_request(src: usize, addr: Addr, data: Data) -> Self {
    Self {
      src,
      payload: NocPayload {
        cmd: Command::StoreRequest,
        data,
        addr,
        tag: LoadTag::default(),
      },
      ..Default::default()
    }
  }

  /// Inbound load request from tile `src_tile` of node `src`.
  pub fn load_request(src: usize, src_tile: usize, addr: Addr, tag: LoadTag) -> Self {
    Self {
      src,
      src_tile,
      payload: NocPayload {
        cmd: Command::LoadRequest,
        data: Data::default(),
        addr,
        tag,
      },
      ..Default::default()
    }
  }

  /// Inbound response to a load this node issued.
  pub fn load_response(data: Data, addr: Addr, tag: LoadTag) -> Self {
    Self {
      payload: NocPayload {
        cmd: Command::LoadResponse,
        data,
        addr,
        tag,
      },
      ..Default::default()
    }
  }
}

/// Ready signals of the three egress channels for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EgressReady {
  #[serde(default = "ready")]
  pub store: bool,
  #[serde(default = "ready")]
  pub load_request: bool,
  #[serde(default = "ready")]
  pub load_response: bool,
}

fn ready() -> bool {
  true
}

impl Default for EgressReady {
  fn default() -> Self {
    Self {
      store: true,
      load_request: true,
      load_response: true,
    }
  }
}

/// Everything presented to the data memory during one tick.
///
/// Vectors are indexed by tile; a missing or `None` entry means the port is idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
  #[serde(default)]
  pub write_addr: Vec<Option<Addr>>,
  #[serde(default)]
  pub write_data: Vec<Option<Data>>,
  #[serde(default)]
  pub read_req: Vec<Option<ReadRequest>>,
  #[serde(default)]
  pub noc_store_request: Option<NocPacket>,
  #[serde(default)]
  pub noc_load_request: Option<NocPacket>,
  #[serde(default)]
  pub noc_load_response: Option<NocPacket>,
  #[serde(default)]
  pub egress_ready: EgressReady,
}

fn set_port<T>(ports: &mut Vec<Option<T>>, index: usize, value: T) {
  if ports.len() <= index {
    ports.resize_with(index + 1, || None);
  }
  ports[index] = Some(value);
}

impl TickInput {
  pub fn with_store(mut self, tile: usize, addr: Addr, data: Data) -> Self {
    set_port(&mut self.write_addr, tile, addr);
    set_port(&mut self.write_data, tile, data);
    self
  }

  pub fn with_write_addr(mut self, tile: usize, addr: Addr) -> Self {
    set_port(&mut self.write_addr, tile, addr);
    self
  }

  pub fn with_write_data(mut self, tile: usize, data: Data) -> Self {
    set_port(&mut self.write_data, tile, data);
    self
  }

  pub fn with_read(mut self, tile: usize, req: ReadRequest) -> Self {
    set_port(&mut self.read_req, tile, req);
    self
  }

  pub fn with_noc_store(mut self, pkt: NocPacket) -> Self {
    self.noc_store_request = Some(pkt);
    self
  }

  pub fn with_noc_load_request(mut self, pkt: NocPacket) -> Self {
    self.noc_load_request = Some(pkt);
    self
  }

  pub fn with_noc_load_response(mut self, pkt: NocPacket) -> Self {
    self.noc_load_response = Some(pkt);
    self
  }

  pub fn write_addr(&self, tile: usize) -> Option<Addr> {
    self.write_addr.get(tile).copied().flatten()
  }

  pub fn write_data(&self, tile: usize) -> Option<Data> {
    self.write_data.get(tile).copied().flatten()
  }

  pub fn read_req(&self, tile: usize) -> Option<ReadRequest> {
    self.read_req.get(tile).copied().flatten()
  }
}

/// Everything the data memory drives during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
  pub write_addr_accepted: Vec<bool>,
  pub write_data_accepted: Vec<bool>,
  pub read_accepted: Vec<bool>,
  pub read_data: Vec<Option<Data>>,
  pub noc_store_request_accepted: bool,
  pub noc_load_request_accepted: bool,
  pub noc_load_response_accepted: bool,
  pub send_store: Option<NocPacket>,
  pub send_load_request: Option<NocPacket>,
  pub send_load_response: Option<NocPacket>,
  /// Preload finished; live traffic is served from the next tick on.
  pub init_done: bool,
}

impl TickOutput {
  pub(crate) fn idle(num_rd_tiles: usize, num_wr_tiles: usize) -> Self {
    Self {
      write_addr_accepted: vec![false; num_wr_tiles],
      write_data_accepted: vec![false; num_wr_tiles],
      read_accepted: vec![false; num_rd_tiles],
      read_data: vec![None; num_rd_tiles],
      ..Default::default()
    }
  }
}
