/// Per-tick outcome of one crossbar arbitration.
///
/// Built once per tick and only read afterwards: bank steering, data steering
/// and egress packing all index into the same record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantMap {
  by_input: Vec<Option<usize>>,
  by_output: Vec<Option<usize>>,
}

impl GrantMap {
  /// Output granted to `input`, if any.
  pub fn output_of(&self, input: usize) -> Option<usize> {
    self.by_input.get(input).copied().flatten()
  }

  /// Input that won `output`, if any.
  pub fn winner(&self, output: usize) -> Option<usize> {
    self.by_output.get(output).copied().flatten()
  }

  pub fn is_granted(&self, input: usize) -> bool {
    self.output_of(input).is_some()
  }

  /// `(input, output)` pairs in output order.
  pub fn grants(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
    self
      .by_output
      .iter()
      .enumerate()
      .filter_map(|(output, input)| input.map(|input| (input, output)))
  }
}

/// N-input, M-output crossbar with one round-robin arbiter per output.
#[derive(Debug, Clone)]
pub struct Crossbar {
  num_inputs: usize,
  num_outputs: usize,
  priority: Vec<usize>,
}

impl Crossbar {
  pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
    Self {
      num_inputs,
      num_outputs,
      priority: vec![0; num_outputs],
    }
  }

  pub fn reset(&mut self) {
    self.priority.iter_mut().for_each(|p| *p = 0);
  }

  /// Grants at most one requester per ready output.
  ///
  /// `requests[i]` is the output input `i` wants this tick; `ready[o]` says
  /// whether output `o` can take a packet. Winners move to the lowest priority
  /// of their output for the next tick.
  pub fn arbitrate(&mut self, requests: &[Option<usize>], ready: &[bool]) -> GrantMap {
    let mut by_input = vec![None; self.num_inputs];
    let mut by_output = vec![None; self.num_outputs];

    for output in 0..self.num_outputs {
      if !ready.get(output).copied().unwrap_or(false) {
        continue;
      }
      let start = self.priority[output];
      let winner = (0..self.num_inputs)
        .map(|step| (start + step) % self.num_inputs)
        .find(|&input| requests.get(input).copied().flatten() == Some(output));
      if let Some(input) = winner {
        by_input[input] = Some(output);
        by_output[output] = Some(input);
        self.priority[output] = (input + 1) % self.num_inputs;
      }
    }

    GrantMap { by_input, by_output }
  }
}
