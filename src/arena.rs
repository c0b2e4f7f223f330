use std::ptr::NonNull;

use libc::{c_void, free, malloc};

use crate::{
  align::ALIGNMENT,
  error::{PoolError, Result},
};

/// The contiguous byte range backing every block of a pool.
///
/// Reserved once from the system allocator and handed back on drop.
pub(crate) struct Arena {
  base: NonNull<u8>,
  capacity: usize,
}

impl Arena {
  pub fn reserve(capacity: usize) -> Result<Self> {
    let address = unsafe { malloc(capacity) } as *mut u8;

    let base = NonNull::new(address).ok_or(PoolError::ReservationFailed { capacity })?;
    debug_assert_eq!(base.as_ptr() as usize % ALIGNMENT, 0);

    Ok(Self { base, capacity })
  }

  pub fn base(&self) -> usize {
    self.base.as_ptr() as usize
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Pointer to the byte `offset` bytes into the arena.
  pub fn at(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    debug_assert!(offset < self.capacity);

    unsafe { self.base.add(offset) }
  }

  /// Offset of `ptr` from the base, if it points inside the arena.
  pub fn offset_of(
    &self,
    ptr: NonNull<u8>,
  ) -> Option<usize> {
    let offset = (ptr.as_ptr() as usize).checked_sub(self.base())?;

    (offset < self.capacity).then_some(offset)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe { free(self.base.as_ptr() as *mut c_void) };
  }
}
