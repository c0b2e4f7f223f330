use std::fmt;

use serde::{Deserialize, Serialize};

/// Running allocation counters of a pool.
///
/// `current_usage == total_allocated - total_freed` holds after every
/// completed operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
  pub total_allocated: usize,
  pub total_freed: usize,
  pub current_usage: usize,
  pub peak_usage: usize,
  pub allocation_count: usize,
  pub free_count: usize,
}

impl Stats {
  pub(crate) fn record_allocation(
    &mut self,
    size: usize,
  ) {
    self.total_allocated += size;
    self.current_usage += size;
    self.allocation_count += 1;
    if self.current_usage > self.peak_usage {
      self.peak_usage = self.current_usage;
    }
  }

  pub(crate) fn record_release(
    &mut self,
    size: usize,
  ) {
    self.record_shrink(size);
    self.free_count += 1;
  }

  /// Credits bytes handed back by an in-place shrink. Not counted as a free.
  pub(crate) fn record_shrink(
    &mut self,
    size: usize,
  ) {
    self.total_freed += size;
    self.current_usage -= size;
  }

  /// Bytes allocated and never freed so far.
  pub fn leaked_bytes(&self) -> usize {
    self.total_allocated.saturating_sub(self.total_freed)
  }
}

impl fmt::Display for Stats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Memory Manager Statistics:")?;
    writeln!(f, "-------------------------")?;
    writeln!(f, "Total Allocated: {} bytes", self.total_allocated)?;
    writeln!(f, "Total Freed: {} bytes", self.total_freed)?;
    writeln!(f, "Current Usage: {} bytes", self.current_usage)?;
    writeln!(f, "Peak Usage: {} bytes", self.peak_usage)?;
    writeln!(f, "Allocation Count: {}", self.allocation_count)?;
    writeln!(f, "Free Count: {}", self.free_count)?;
    write!(f, "-------------------------")
  }
}
