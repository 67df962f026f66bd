use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::bank::BankArray;
use super::types::Data;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitState {
  /// Copying the preload image, one row per tick.
  Loading,
  /// No image: one tick passes before serving traffic.
  Settling,
  Done,
}

/// Synchronous initializer run after every reset.
#[derive(Debug, Clone)]
pub struct Preloader {
  image: Option<Vec<Vec<Data>>>,
  bank_size: usize,
  state: InitState,
  cursor: usize,
}

impl Preloader {
  pub fn new(image: Option<Vec<Vec<Data>>>, bank_size: usize) -> Self {
    let mut preloader = Self {
      image,
      bank_size,
      state: InitState::Done,
      cursor: 0,
    };
    preloader.reset();
    preloader
  }

  pub fn reset(&mut self) {
    self.state = if self.image.is_some() {
      InitState::Loading
    } else {
      InitState::Settling
    };
    self.cursor = 0;
  }

  pub fn state(&self) -> InitState {
    self.state
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn is_done(&self) -> bool {
    self.state == InitState::Done
  }

  /// Advances one tick. While loading, every bank's write port is driven with
  /// the current image row, overriding live traffic.
  pub fn tick(&mut self, banks: &mut BankArray) {
    match self.state {
      InitState::Done => {},
      InitState::Settling => {
        self.state = InitState::Done;
        info!("data memory ready (no preload image)");
      },
      InitState::Loading => {
        if let Some(image) = &self.image {
          for (bank, row) in image.iter().enumerate() {
            if let Some(&word) = row.get(self.cursor) {
              banks.stage_write(bank, self.cursor, word);
            }
          }
        }
        debug!("preload row {}", self.cursor);
        if self.cursor + 1 < self.bank_size {
          self.cursor += 1;
        } else {
          self.state = InitState::Done;
          self.cursor = 0;
          info!("data memory ready ({} rows preloaded)", self.bank_size);
        }
      },
    }
  }
}
