use thiserror::Error;

/// Result alias used by every fallible pool operation.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors reported by [`PoolAllocator`](crate::PoolAllocator).
///
/// Everything except [`PoolError::ReservationFailed`] is recoverable: the
/// allocator state is left exactly as it was before the failing call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
  #[error(
    "Out of memory: requested {requested} bytes, {available} bytes available, largest free block {largest_free} bytes"
  )]
  OutOfMemory {
    requested: usize,
    available: usize,
    largest_free: usize,
  },

  #[error("Invalid pointer: 0x{0:x} is not an allocated block of this pool")]
  InvalidPointer(usize),

  #[error("Failed to reserve a memory pool of {capacity} bytes")]
  ReservationFailed { capacity: usize },

  #[error("Invalid pool capacity: {capacity} bytes holds no aligned block")]
  InvalidCapacity { capacity: usize },

  #[error("Block ledger corrupted: {0}")]
  Corrupted(#[from] LedgerFault),
}

/// Broken ledger invariant found by [`PoolAllocator::verify`](crate::PoolAllocator::verify).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerFault {
  #[error("block at offset {offset} does not start where the previous block ended ({expected})")]
  Gap { offset: usize, expected: usize },

  #[error("block at offset {offset} has size {size}, not a positive multiple of the alignment")]
  BadSize { offset: usize, size: usize },

  #[error("adjacent free blocks at offsets {first} and {second}")]
  AdjacentFree { first: usize, second: usize },

  #[error("blocks cover {covered} bytes of a {capacity} byte pool")]
  Coverage { covered: usize, capacity: usize },
}
