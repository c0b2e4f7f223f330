use std::ptr::{self, NonNull};

use log::{debug, info, warn};

use crate::{
  align::{align_down, align_up},
  arena::Arena,
  block::BlockId,
  config::PoolConfig,
  error::{PoolError, Result},
  ledger::Ledger,
  report::{BlockInfo, BlockReport},
  stats::Stats,
};

/// First-fit allocator over a single pre-reserved arena.
///
/// Not `Send` nor `Sync`: one owner issues every call.
pub struct PoolAllocator {
  arena: Arena,
  ledger: Ledger,
  stats: Stats,
  used: usize,
  min_split_remainder: usize,
}

impl PoolAllocator {
  /// Reserves a pool of `capacity` bytes with default settings.
  pub fn new(capacity: usize) -> Result<Self> {
    Self::with_config(PoolConfig::builder().capacity(capacity).build())
  }

  pub fn with_config(config: PoolConfig) -> Result<Self> {
    let capacity = align_down(config.capacity);

    if capacity == 0 {
      return Err(PoolError::InvalidCapacity {
        capacity: config.capacity,
      });
    }

    let arena = Arena::reserve(capacity)?;

    info!(
      "Memory pool initialized with {} bytes at {:#x}",
      capacity,
      arena.base()
    );

    Ok(Self {
      arena,
      ledger: Ledger::new(capacity),
      stats: Stats::default(),
      used: 0,
      min_split_remainder: config.min_split_remainder,
    })
  }

  /// Hands out `size` bytes (rounded up to 8), or `None` when `size` is zero.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Option<NonNull<u8>>> {
    if size == 0 {
      return Ok(None);
    }

    let id = self.allocate_block(size)?;

    Ok(Some(self.arena.at(self.ledger.get(id).offset)))
  }

  /// Returns the block starting at `address` to the pool. `None` is a no-op.
  pub fn release(
    &mut self,
    address: Option<NonNull<u8>>,
  ) -> Result<()> {
    let Some(address) = address else {
      return Ok(());
    };

    let id = self.find_block(address)?;
    self.release_block(id);

    Ok(())
  }

  /// Grows or shrinks the block at `address`.
  ///
  /// Shrinking keeps the address. Growing moves the contents to a new block
  /// and releases the old one; if no block fits, the old one is untouched.
  pub fn resize(
    &mut self,
    address: Option<NonNull<u8>>,
    new_size: usize,
  ) -> Result<Option<NonNull<u8>>> {
    let Some(address) = address else {
      return self.allocate(new_size);
    };

    if new_size == 0 {
      self.release(Some(address))?;
      return Ok(None);
    }

    let id = self.find_block(address)?;
    let old_size = self.ledger.get(id).size;
    let rounded = align_up(new_size).ok_or_else(|| self.out_of_memory(new_size))?;

    if old_size >= rounded {
      if let Some(freed) = self.ledger.split(id, rounded, self.min_split_remainder) {
        self.used -= freed;
        self.stats.record_shrink(freed);
        self.ledger.coalesce();

        debug!(
          "Shrunk block at {:#x} from {} to {} bytes",
          address.as_ptr() as usize,
          old_size,
          rounded
        );
      }

      return Ok(Some(address));
    }

    let new_id = self.allocate_block(rounded)?;
    let destination = self.arena.at(self.ledger.get(new_id).offset);

    // The old block is still marked used, so the two regions cannot overlap.
    unsafe { ptr::copy_nonoverlapping(address.as_ptr(), destination.as_ptr(), old_size) };

    self.release_block(id);

    debug!(
      "Moved block from {:#x} to {:#x} ({} -> {} bytes)",
      address.as_ptr() as usize,
      destination.as_ptr() as usize,
      old_size,
      rounded
    );

    Ok(Some(destination))
  }

  pub fn stats(&self) -> Stats {
    self.stats
  }

  pub fn dump_blocks(&self) -> BlockReport {
    let base = self.arena.base();

    BlockReport::new(
      self
        .ledger
        .iter()
        .map(|(_, block)| BlockInfo {
          address: base + block.offset,
          offset: block.offset,
          size: block.size,
          is_free: block.is_free,
        })
        .collect(),
    )
  }

  /// Reports whether more bytes were allocated than freed.
  pub fn check_leaks(&self) -> bool {
    let leaked = self.stats.leaked_bytes();

    if leaked > 0 {
      warn!("Memory leak detected: {} bytes still allocated", leaked);
      return true;
    }

    info!("No memory leaks detected");
    false
  }

  /// Walks the ledger and reports the first broken block invariant.
  pub fn verify(&self) -> Result<()> {
    self.ledger.verify(self.arena.capacity())?;

    Ok(())
  }

  /// Releases the arena. Every address handed out becomes dangling.
  pub fn teardown(self) {
    info!(
      "Tearing down memory pool at {:#x}: {} blocks, {} bytes still in use",
      self.arena.base(),
      self.ledger.len(),
      self.used
    );
  }

  pub fn base_address(&self) -> usize {
    self.arena.base()
  }

  pub fn capacity(&self) -> usize {
    self.arena.capacity()
  }

  pub fn used(&self) -> usize {
    self.used
  }

  pub fn available(&self) -> usize {
    self.capacity() - self.used
  }

  pub fn block_count(&self) -> usize {
    self.ledger.len()
  }

  pub fn largest_free_block(&self) -> usize {
    self.ledger.largest_free()
  }

  fn allocate_block(
    &mut self,
    size: usize,
  ) -> Result<BlockId> {
    let rounded = align_up(size).ok_or_else(|| self.out_of_memory(size))?;

    let Some(id) = self.ledger.find_free_block(rounded) else {
      let err = self.out_of_memory(rounded);
      warn!("Memory allocation failed: {}", err);
      return Err(err);
    };

    if let Some(remainder) = self.ledger.split(id, rounded, self.min_split_remainder) {
      debug!("Split block: keeping {} bytes, {} bytes left free", rounded, remainder);
    }

    let block = self.ledger.get_mut(id);
    block.is_free = false;
    let (offset, size) = (block.offset, block.size);

    self.used += size;
    self.stats.record_allocation(size);

    debug!(
      "Allocated {} bytes at {:#x} (requested {})",
      size,
      self.arena.base() + offset,
      rounded
    );

    Ok(id)
  }

  fn release_block(
    &mut self,
    id: BlockId,
  ) {
    let block = self.ledger.get_mut(id);
    block.is_free = true;
    let (offset, size) = (block.offset, block.size);

    self.used -= size;
    self.stats.record_release(size);

    let merged = self.ledger.coalesce();

    debug!(
      "Freed {} bytes at {:#x}, merged {} blocks",
      size,
      self.arena.base() + offset,
      merged
    );
  }

  fn find_block(
    &self,
    address: NonNull<u8>,
  ) -> Result<BlockId> {
    self
      .arena
      .offset_of(address)
      .and_then(|offset| self.ledger.find_allocated(offset))
      .ok_or_else(|| {
        let err = PoolError::InvalidPointer(address.as_ptr() as usize);
        warn!("{}", err);
        err
      })
  }

  fn out_of_memory(
    &self,
    requested: usize,
  ) -> PoolError {
    PoolError::OutOfMemory {
      requested,
      available: self.available(),
      largest_free: self.ledger.largest_free(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::BLOCK_OVERHEAD;

  fn pool(capacity: usize) -> PoolAllocator {
    PoolAllocator::new(capacity).unwrap()
  }

  fn layout(pool: &PoolAllocator) -> Vec<(usize, usize, bool)> {
    pool
      .dump_blocks()
      .iter()
      .map(|block| (block.offset, block.size, block.is_free))
      .collect()
  }

  fn offset(
    pool: &PoolAllocator,
    ptr: NonNull<u8>,
  ) -> usize {
    ptr.as_ptr() as usize - pool.base_address()
  }

  #[test]
  fn test_alloc() {
    let mut pool = pool(1024);

    unsafe {
      let first_addr = pool.allocate(8).unwrap().unwrap().cast::<u64>();

      first_addr.write(3u64);

      assert_eq!(first_addr.read(), 3);

      let size: usize = 6;

      let second_addr = pool.allocate(size * 2).unwrap().unwrap().cast::<u16>();

      for i in 0..size {
        second_addr.add(i).write((i + 1) as u16);
      }

      assert_eq!(first_addr.read(), 3);

      for i in 0..size {
        assert_eq!((i + 1) as u16, second_addr.add(i).read())
      }

      pool.release(Some(first_addr.cast())).unwrap();

      let third_addr = pool.allocate(4).unwrap().unwrap();

      assert_eq!(first_addr.cast::<u8>(), third_addr);

      pool.release(Some(third_addr)).unwrap();

      let fourth_addr = pool.allocate(16).unwrap().unwrap().cast::<u64>();

      fourth_addr.write(25);

      assert!(fourth_addr.cast::<u8>() > third_addr);

      assert_eq!(fourth_addr.read(), 25);
    }
  }

  #[test]
  fn test_zero_size_is_not_an_error() {
    let mut pool = pool(128);

    assert_eq!(pool.allocate(0), Ok(None));
    assert_eq!(pool.stats(), Stats::default());
  }

  #[test]
  fn test_invalid_capacity() {
    assert_eq!(
      PoolAllocator::new(7).err(),
      Some(PoolError::InvalidCapacity { capacity: 7 })
    );
    assert_eq!(pool(1020).capacity(), 1016);
  }

  #[test]
  fn test_unsplit_block_is_charged_whole() {
    let mut pool = pool(1024);

    let a = pool.allocate(100).unwrap();
    pool.allocate(50).unwrap();
    pool.release(a).unwrap();

    // 104 bytes are free at offset 0; 96 bytes leave too little to split.
    let b = pool.allocate(96).unwrap();

    assert_eq!(a, b);
    assert_eq!(pool.stats().current_usage, 104 + 56);
    assert_eq!(pool.used(), pool.stats().current_usage);

    pool.release(b).unwrap();
    assert_eq!(pool.stats().current_usage, 56);
  }

  #[test]
  fn test_split_threshold_is_configurable() {
    let config = PoolConfig::builder()
      .capacity(256)
      .min_split_remainder(0)
      .build();
    let mut eager = PoolAllocator::with_config(config).unwrap();

    eager.allocate(248).unwrap();

    assert_eq!(layout(&eager), vec![(0, 248, false), (248, 8, true)]);

    let mut tight = pool(256);
    tight.allocate(256 - 32 - BLOCK_OVERHEAD).unwrap();

    assert_eq!(tight.block_count(), 1);
  }

  #[test]
  fn test_release_coalesces_both_neighbours() {
    let mut pool = pool(1024);

    let a = pool.allocate(128).unwrap();
    let b = pool.allocate(128).unwrap();
    let c = pool.allocate(128).unwrap();

    pool.release(a).unwrap();
    pool.release(c).unwrap();
    assert_eq!(layout(&pool), vec![(0, 128, true), (128, 128, false), (256, 768, true)]);

    pool.release(b).unwrap();
    assert_eq!(layout(&pool), vec![(0, 1024, true)]);
  }

  #[test]
  fn test_invalid_pointers_are_rejected() {
    let mut pool = pool(256);
    let a = pool.allocate(64).unwrap().unwrap();
    let before = pool.stats();

    let interior = unsafe { a.add(8) };
    let mut foreign = 0u64;

    assert_eq!(
      pool.release(Some(interior)),
      Err(PoolError::InvalidPointer(interior.as_ptr() as usize))
    );
    assert!(matches!(
      pool.release(Some(NonNull::from(&mut foreign).cast())),
      Err(PoolError::InvalidPointer(_))
    ));
    assert!(matches!(
      pool.resize(Some(interior), 128),
      Err(PoolError::InvalidPointer(_))
    ));
    assert_eq!(pool.stats(), before);
    assert!(pool.verify().is_ok());
  }

  #[test]
  fn test_resize_in_place_credits_tail() {
    let mut pool = pool(1024);
    let a = pool.allocate(512).unwrap();

    let b = pool.resize(a, 100).unwrap();

    assert_eq!(a, b);
    assert_eq!(layout(&pool), vec![(0, 104, false), (104, 920, true)]);
    assert_eq!(pool.stats().current_usage, 104);
    assert_eq!(pool.stats().total_freed, 408);
    assert_eq!(pool.stats().free_count, 0);
  }

  #[test]
  fn test_resize_growth_failure_keeps_block() {
    let mut pool = pool(256);
    let a = pool.allocate(128).unwrap();
    let before = layout(&pool);

    assert!(matches!(
      pool.resize(a, 512),
      Err(PoolError::OutOfMemory { requested: 512, .. })
    ));
    assert_eq!(layout(&pool), before);
    assert_eq!(pool.stats().current_usage, 128);
  }

  #[test]
  fn test_resize_null_and_zero() {
    let mut pool = pool(256);

    let a = pool.resize(None, 10).unwrap();
    assert!(a.is_some());
    assert_eq!(pool.stats().current_usage, 16);

    assert_eq!(pool.resize(a, 0), Ok(None));
    assert_eq!(pool.stats().current_usage, 0);
    assert_eq!(pool.stats().free_count, 1);
  }

  #[test]
  fn test_out_of_memory_reports_largest_free() {
    let mut pool = pool(1024);
    pool.allocate(800).unwrap();

    assert_eq!(
      pool.allocate(300),
      Err(PoolError::OutOfMemory {
        requested: 304,
        available: 224,
        largest_free: 224,
      })
    );
    assert!(matches!(
      pool.allocate(usize::MAX),
      Err(PoolError::OutOfMemory { .. })
    ));
  }

  #[test]
  fn test_addresses_are_aligned() {
    let mut pool = pool(4096);

    for size in [1, 3, 7, 9, 15, 33, 100] {
      let ptr = pool.allocate(size).unwrap().unwrap();
      assert_eq!(offset(&pool, ptr) % 8, 0);
    }
  }
}
