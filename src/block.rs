use std::mem;

/// Index of a block descriptor inside the ledger's slot arena.
pub(crate) type BlockId = usize;

/// Bookkeeping cost of one descriptor, used by the default split threshold.
pub const BLOCK_OVERHEAD: usize = mem::size_of::<Block>();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block {
  /// Distance from the pool base, in bytes.
  pub offset: usize,
  pub size: usize,
  pub is_free: bool,
  pub next: Option<BlockId>,
}

impl Block {
  pub fn new(
    offset: usize,
    size: usize,
    is_free: bool,
    next: Option<BlockId>,
  ) -> Self {
    Self {
      offset,
      size,
      is_free,
      next,
    }
  }

  /// One past the last byte covered by this block.
  pub fn end(&self) -> usize {
    self.offset + self.size
  }
}
