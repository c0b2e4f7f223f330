use serde::{Deserialize, Serialize};

use crate::block::BLOCK_OVERHEAD;

/// Pool size reserved when no capacity is given (1 MiB).
pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

/// Smallest leftover, in bytes, that is not worth carving into its own block.
pub const DEFAULT_MIN_SPLIT_REMAINDER: usize = BLOCK_OVERHEAD + 32;

/// Settings for a [`PoolAllocator`](crate::PoolAllocator).
///
/// Missing fields fall back to their defaults when deserialized, so a
/// document like `{"capacity": 4096}` is enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
  /// Bytes reserved for the arena. Rounded down to the alignment unit.
  pub capacity: usize,
  /// A free block is split only if it exceeds the requested size by more
  /// than this many bytes.
  pub min_split_remainder: usize,
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
      min_split_remainder: DEFAULT_MIN_SPLIT_REMAINDER,
    }
  }
}

impl PoolConfig {
  pub fn builder() -> PoolConfigBuilder {
    PoolConfigBuilder(Self::default())
  }
}

#[derive(Debug, Clone)]
pub struct PoolConfigBuilder(PoolConfig);

impl PoolConfigBuilder {
  pub fn capacity(
    mut self,
    bytes: usize,
  ) -> Self {
    self.0.capacity = bytes;
    self
  }

  pub fn min_split_remainder(
    mut self,
    bytes: usize,
  ) -> Self {
    self.0.min_split_remainder = bytes;
    self
  }

  pub fn build(self) -> PoolConfig {
    self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = PoolConfig::default();

    assert_eq!(config.capacity, 1024 * 1024);
    assert_eq!(config.min_split_remainder, BLOCK_OVERHEAD + 32);
  }

  #[test]
  fn test_builder_overrides() {
    let config = PoolConfig::builder()
      .capacity(4096)
      .min_split_remainder(0)
      .build();

    assert_eq!(
      config,
      PoolConfig {
        capacity: 4096,
        min_split_remainder: 0,
      }
    );
  }

  #[test]
  fn test_partial_document() {
    let config: PoolConfig = serde_json::from_str(r#"{"capacity": 2048}"#).unwrap();

    assert_eq!(config.capacity, 2048);
    assert_eq!(config.min_split_remainder, DEFAULT_MIN_SPLIT_REMAINDER);
  }
}
