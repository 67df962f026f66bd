use cgramem::arch::cgra::{
  Command, Data, DataMem, DataMemConfig, LoadTag, NocPacket, PendingLoadPolicy, ReadMode, ReadRequest, TickInput,
  TickOutput, TopologyEntry,
};

const BANK0: [u32; 16] = [
  0xa6, 0xa7, 0xa8, 0xa9, 0xb0, 0xb1, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xc0, 0xc1,
];
const BANK1: [u32; 16] = [
  0xc2, 0xc3, 0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xd0, 0xd1, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7,
];

fn two_bank_config(read_mode: ReadMode, policy: PendingLoadPolicy) -> DataMemConfig {
  DataMemConfig {
    data_mem_size_global: 64,
    data_mem_size_per_bank: 16,
    num_banks: 2,
    num_rd_tiles: 2,
    num_wr_tiles: 2,
    address_lower: 0,
    address_upper: 31,
    node_id: 0,
    topology: vec![
      TopologyEntry { id: 0, x: 0, y: 0 },
      TopologyEntry { id: 1, x: 1, y: 0 },
    ],
    read_mode,
    pending_load_policy: policy,
    preload: Some(vec![
      BANK0.iter().map(|&v| Data::valid(v)).collect(),
      BANK1.iter().map(|&v| Data::valid(v)).collect(),
    ]),
    ..Default::default()
  }
}

/// Builds a memory and runs it through preload.
fn ready_mem(config: DataMemConfig) -> DataMem {
  let mut mem = DataMem::new(config).unwrap();
  let mut ticks = 0;
  while !mem.is_ready() {
    let out = mem.tick(&TickInput::default()).unwrap();
    assert!(out.read_accepted.iter().all(|a| !a));
    ticks += 1;
  }
  assert_eq!(ticks, 16);
  mem
}

fn response(payload: u32, addr: u32, kernel_id: usize, load_id: usize) -> NocPacket {
  NocPacket::load_response(Data::valid(payload), addr, LoadTag::new(kernel_id, load_id))
}

fn store_egress(out: &TickOutput) -> Option<(u32, u32)> {
  out
    .send_store
    .map(|pkt| (pkt.payload.addr, pkt.payload.data.payload))
}

/// Tile 0 reads 0, 44, 44, 1, 2 and tile 1 reads 58, 16, 17, 58, 18 while
/// both tiles store one local and one foreign word.
fn reference_ticks() -> Vec<TickInput> {
  vec![
    TickInput::default()
      .with_read(0, ReadRequest::new(0))
      .with_read(1, ReadRequest::tagged(58, 2, 2))
      .with_store(0, 2, Data::valid(0xa80))
      .with_store(1, 40, Data::valid(0xd040)),
    TickInput::default()
      .with_read(0, ReadRequest::tagged(44, 1, 1))
      .with_read(1, ReadRequest::new(16))
      .with_store(0, 45, Data::valid(0xd545))
      .with_store(1, 31, Data::valid(0xd70))
      .with_noc_load_response(response(0xabcd, 44, 1, 1)),
    TickInput::default()
      .with_read(0, ReadRequest::tagged(44, 1, 1))
      .with_read(1, ReadRequest::new(17))
      .with_noc_load_response(response(0xdcba, 58, 2, 2)),
    TickInput::default()
      .with_read(0, ReadRequest::new(1))
      .with_read(1, ReadRequest::tagged(58, 2, 2)),
    TickInput::default()
      .with_read(0, ReadRequest::new(2))
      .with_read(1, ReadRequest::new(18)),
  ]
}

#[test]
fn test_reference_scenario_non_blocking() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  let outs: Vec<TickOutput> = reference_ticks().iter().map(|input| mem.tick(input).unwrap()).collect();

  let tile0: Vec<_> = outs.iter().map(|o| o.read_data[0]).collect();
  let tile1: Vec<_> = outs.iter().map(|o| o.read_data[1]).collect();
  assert_eq!(
    tile0,
    vec![
      Some(Data::valid(0xa6)),
      Some(Data::new(0, false)),
      Some(Data::valid(0xabcd)),
      Some(Data::valid(0xa7)),
      Some(Data::valid(0xa80)),
    ]
  );
  assert_eq!(
    tile1,
    vec![
      Some(Data::new(0, false)),
      Some(Data::valid(0xc2)),
      Some(Data::valid(0xc3)),
      Some(Data::valid(0xdcba)),
      Some(Data::valid(0xc4)),
    ]
  );
  assert!(outs.iter().all(|o| o.read_accepted == vec![true, true]));

  // One remote load leaves the node; the second waits behind the gate and
  // is satisfied by the response that arrives for it anyway.
  let requests: Vec<_> = outs
    .iter()
    .filter_map(|o| o.send_load_request)
    .map(|pkt| (pkt.payload.addr, pkt.payload.tag, pkt.src_tile))
    .collect();
  assert_eq!(requests, vec![(58, LoadTag::new(2, 2), 1)]);
  assert!(outs[1].noc_load_response_accepted);
  assert!(outs[2].noc_load_response_accepted);

  let stores: Vec<_> = outs.iter().filter_map(store_egress).collect();
  assert_eq!(stores, vec![(40, 0xd040), (45, 0xd545)]);

  assert_eq!(mem.bank_contents(0)[2], Data::valid(0xa80));
  assert_eq!(mem.bank_contents(1)[15], Data::valid(0xd70));
}

#[test]
fn test_single_tile_scenario_keeps_remote_loads_flowing() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  let ticks = vec![
    TickInput::default().with_read(0, ReadRequest::new(0)),
    TickInput::default()
      .with_read(0, ReadRequest::tagged(44, 1, 1))
      .with_noc_load_response(response(0xabcd, 44, 1, 1)),
    TickInput::default().with_read(0, ReadRequest::tagged(44, 1, 1)),
    TickInput::default().with_read(0, ReadRequest::new(1)),
    TickInput::default().with_read(0, ReadRequest::new(2)),
  ];
  let outs: Vec<TickOutput> = ticks.iter().map(|input| mem.tick(input).unwrap()).collect();
  let tile0: Vec<_> = outs.iter().map(|o| o.read_data[0]).collect();
  assert_eq!(
    tile0,
    vec![
      Some(Data::valid(0xa6)),
      Some(Data::new(0, false)),
      Some(Data::valid(0xabcd)),
      Some(Data::valid(0xa7)),
      Some(Data::valid(0xa8)),
    ]
  );
  assert_eq!(outs[1].send_load_request.map(|pkt| pkt.payload.addr), Some(44));

  // A later remote load on a fresh tag still leaves the node.
  let out = mem.tick(&TickInput::default().with_read(0, ReadRequest::tagged(50, 0, 3))).unwrap();
  let pkt = out.send_load_request.unwrap();
  assert_eq!((pkt.payload.addr, pkt.payload.tag), (50, LoadTag::new(0, 3)));
}

#[test]
fn test_reference_scenario_strict() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Strict));
  let outs: Vec<TickOutput> = reference_ticks().iter().map(|input| mem.tick(input).unwrap()).collect();
  assert_eq!(outs[0].read_data, vec![Some(Data::valid(0xa6)), None]);
  assert_eq!(outs[1].read_data, vec![None, Some(Data::valid(0xc2))]);
  assert_eq!(outs[2].read_data[0], Some(Data::valid(0xabcd)));
  assert_eq!(outs[3].read_data[1], Some(Data::valid(0xdcba)));
}

#[test]
fn test_preloaded_word_without_store() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  let out = mem.tick(&TickInput::default().with_read(0, ReadRequest::new(2))).unwrap();
  assert_eq!(out.read_data[0], Some(Data::valid(0xa8)));
}

#[test]
fn test_window_exclusion() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  let before = [mem.bank_contents(0), mem.bank_contents(1)];
  for addr in [32u32, 33, 47, 63] {
    let out = mem.tick(&TickInput::default().with_store(0, addr, Data::valid(0xdead))).unwrap();
    assert_eq!(store_egress(&out), Some((addr, 0xdead)));
    let pkt = out.send_store.unwrap();
    assert_eq!(pkt.payload.cmd, Command::StoreRequest);
    assert_eq!(pkt.src, 0);
    assert_eq!(pkt.dst, 0);
  }
  assert_eq!([mem.bank_contents(0), mem.bank_contents(1)], before);
}

#[test]
fn test_grant_exclusivity_under_contention() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  // Both tiles hammer bank 0 for several ticks; exactly one wins each tick.
  let mut wins = [0usize; 2];
  for _ in 0..6 {
    let input = TickInput::default()
      .with_read(0, ReadRequest::new(3))
      .with_read(1, ReadRequest::new(4));
    let out = mem.tick(&input).unwrap();
    assert_eq!(out.read_accepted.iter().filter(|a| **a).count(), 1);
    for (tile, accepted) in out.read_accepted.iter().enumerate() {
      if *accepted {
        wins[tile] += 1;
      }
    }
  }
  assert_eq!(wins, [3, 3]);
}

#[test]
fn test_remote_load_answered_from_bank() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  let request = NocPacket::load_request(1, 3, 17, LoadTag::new(0, 9));
  let out = mem.tick(&TickInput::default().with_noc_load_request(request)).unwrap();
  assert!(out.noc_load_request_accepted);
  let pkt = out.send_load_response.unwrap();
  assert_eq!(pkt.payload.cmd, Command::LoadResponse);
  assert_eq!(pkt.payload.data, Data::valid(0xc3));
  assert_eq!(pkt.payload.tag, LoadTag::new(0, 9));
  assert_eq!((pkt.dst, pkt.dst_x, pkt.dst_y, pkt.dst_tile), (1, 1, 0, 3));
}

#[test]
fn test_noc_store_forwarded_when_foreign() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  let out = mem
    .tick(&TickInput::default().with_noc_store(NocPacket::store_request(1, 50, Data::valid(0x50))))
    .unwrap();
  assert!(out.noc_store_request_accepted);
  assert_eq!(store_egress(&out), Some((50, 0x50)));
}

#[test]
fn test_blocking_remote_load() {
  let mut mem = ready_mem(two_bank_config(ReadMode::Blocking, PendingLoadPolicy::Optimistic));
  let foreign = ReadRequest::new(44);

  let out = mem.tick(&TickInput::default().with_read(0, foreign)).unwrap();
  assert!(!out.read_accepted[0]);
  let pkt = out.send_load_request.unwrap();
  assert_eq!((pkt.payload.addr, pkt.src_tile), (44, 0));

  // Local traffic keeps flowing while tile 0 waits.
  let input = TickInput::default()
    .with_read(0, foreign)
    .with_read(1, ReadRequest::new(16));
  let out = mem.tick(&input).unwrap();
  assert_eq!(out.read_accepted, vec![false, true]);
  assert_eq!(out.read_data[1], Some(Data::valid(0xc2)));
  assert!(out.send_load_request.is_none());

  let input = TickInput::default()
    .with_read(0, foreign)
    .with_noc_load_response(response(0xabcd, 44, 0, 0));
  let out = mem.tick(&input).unwrap();
  assert!(out.read_accepted[0]);
  assert!(out.noc_load_response_accepted);
  assert_eq!(out.read_data[0], Some(Data::valid(0xabcd)));

  // The gate is open again.
  let out = mem.tick(&TickInput::default().with_read(1, ReadRequest::new(50))).unwrap();
  assert!(out.send_load_request.is_some());
}

#[test]
fn test_out_of_range_tag_changes_nothing() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  let input = TickInput::default()
    .with_store(0, 0, Data::valid(1))
    .with_read(1, ReadRequest::tagged(44, 0, 32));
  assert!(mem.tick(&input).is_err());
  assert_eq!(mem.bank_contents(0)[0], Data::valid(0xa6));
}

#[test]
fn test_reset_reruns_preload() {
  let mut mem = ready_mem(two_bank_config(ReadMode::NonBlocking, PendingLoadPolicy::Optimistic));
  mem.tick(&TickInput::default().with_store(0, 0, Data::valid(0x1))).unwrap();
  assert_eq!(mem.bank_contents(0)[0], Data::valid(0x1));
  mem.reset();
  let mut ticks = 0;
  while !mem.is_ready() {
    mem.tick(&TickInput::default()).unwrap();
    ticks += 1;
  }
  assert_eq!(ticks, 16);
  let out = mem.tick(&TickInput::default().with_read(0, ReadRequest::new(0))).unwrap();
  assert_eq!(out.read_data[0], Some(Data::valid(0xa6)));
}
