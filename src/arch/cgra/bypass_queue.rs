/// One-entry pass-through queue.
///
/// A value can be enqueued only while the queue was empty at the start of the
/// tick, and can be dequeued in the same tick it arrived.
#[derive(Debug, Clone)]
pub struct BypassQueue<T> {
  slot: Option<T>,
}

impl<T> Default for BypassQueue<T> {
  fn default() -> Self {
    Self { slot: None }
  }
}

impl<T: Copy> BypassQueue<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns whether the value was taken.
  pub fn enq(&mut self, value: T) -> bool {
    if self.slot.is_some() {
      return false;
    }
    self.slot = Some(value);
    true
  }

  pub fn peek(&self) -> Option<T> {
    self.slot
  }

  pub fn deq(&mut self) -> Option<T> {
    self.slot.take()
  }

  pub fn clear(&mut self) {
    self.slot = None;
  }
}
