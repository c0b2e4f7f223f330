use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};

/// Read-only view of one block, as seen by [`PoolAllocator::dump_blocks`](crate::PoolAllocator::dump_blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
  pub address: usize,
  pub offset: usize,
  pub size: usize,
  pub is_free: bool,
}

/// Snapshot of every block in ascending address order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReport(Vec<BlockInfo>);

impl BlockReport {
  pub(crate) fn new(blocks: Vec<BlockInfo>) -> Self {
    Self(blocks)
  }

  pub fn free_blocks(&self) -> impl Iterator<Item = &BlockInfo> {
    self.0.iter().filter(|block| block.is_free)
  }

  pub fn used_blocks(&self) -> impl Iterator<Item = &BlockInfo> {
    self.0.iter().filter(|block| !block.is_free)
  }

  pub fn into_inner(self) -> Vec<BlockInfo> {
    self.0
  }
}

impl Deref for BlockReport {
  type Target = [BlockInfo];

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl fmt::Display for BlockReport {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Memory Blocks:")?;
    writeln!(f, "-------------")?;
    for (index, block) in self.0.iter().enumerate() {
      writeln!(
        f,
        "Block {}: Address={:#x}, Size={}, Status={}",
        index + 1,
        block.address,
        block.size,
        if block.is_free { "Free" } else { "Used" }
      )?;
    }
    write!(f, "-------------")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_lists_blocks_in_order() {
    let report = BlockReport::new(vec![
      BlockInfo {
        address: 0x1000,
        offset: 0,
        size: 104,
        is_free: false,
      },
      BlockInfo {
        address: 0x1068,
        offset: 104,
        size: 920,
        is_free: true,
      },
    ]);

    let text = report.to_string();

    assert!(text.contains("Block 1: Address=0x1000, Size=104, Status=Used"));
    assert!(text.contains("Block 2: Address=0x1068, Size=920, Status=Free"));
    assert_eq!(report.free_blocks().count(), 1);
    assert_eq!(report.used_blocks().count(), 1);
    assert_eq!(report.len(), 2);
  }
}
