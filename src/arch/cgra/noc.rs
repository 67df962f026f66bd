use std::collections::BTreeMap;

use super::types::{Addr, Command, Data, LoadTag, NocPacket, NocPayload, NodeCoord};

/// Stamps outbound packets with this node's identity.
#[derive(Debug, Clone)]
pub struct NocStamp {
  node_id: usize,
  coord: NodeCoord,
  topology: BTreeMap<usize, NodeCoord>,
}

impl NocStamp {
  pub fn new(node_id: usize, topology: BTreeMap<usize, NodeCoord>) -> Self {
    let coord = topology.get(&node_id).copied().unwrap_or_default();
    Self {
      node_id,
      coord,
      topology,
    }
  }

  /// Unknown ids resolve to (0, 0).
  pub fn coord_of(&self, node_id: usize) -> NodeCoord {
    self.topology.get(&node_id).copied().unwrap_or_default()
  }

  fn from_here(&self, src_tile: usize, payload: NocPayload) -> NocPacket {
    NocPacket {
      src: self.node_id,
      dst: 0,
      src_x: self.coord.x,
      src_y: self.coord.y,
      dst_x: 0,
      dst_y: 0,
      src_tile,
      dst_tile: 0,
      payload,
    }
  }

  /// Store leaving the node; the network controller resolves the destination.
  pub fn store_request(&self, addr: Addr, data: Data) -> NocPacket {
    self.from_here(
      0,
      NocPayload {
        cmd: Command::StoreRequest,
        data,
        addr,
        tag: LoadTag::default(),
      },
    )
  }

  pub fn load_request(&self, src_tile: usize, addr: Addr, tag: LoadTag) -> NocPacket {
    self.from_here(
      src_tile,
      NocPayload {
        cmd: Command::LoadRequest,
        data: Data::default(),
        addr,
        tag,
      },
    )
  }

  /// Answer to `request`, routed back to its origin node and tile.
  pub fn load_response(&self, request: &NocPacket, data: Data) -> NocPacket {
    let dst = self.coord_of(request.src);
    NocPacket {
      src: self.node_id,
      dst: request.src,
      src_x: self.coord.x,
      src_y: self.coord.y,
      dst_x: dst.x,
      dst_y: dst.y,
      src_tile: 0,
      dst_tile: request.src_tile,
      payload: NocPayload {
        cmd: Command::LoadResponse,
        data,
        addr: request.payload.addr,
        tag: request.payload.tag,
      },
    }
  }
}
