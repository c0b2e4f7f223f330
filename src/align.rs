/// Alignment unit of every block size and every address handed out by the pool.
pub const ALIGNMENT: usize = 8;

/// Rounds the given size up to the pool's [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use rpool::align;
///
/// assert_eq!(align!(1), 8);
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(100), 104);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Same as [`align!`] but returns `None` instead of wrapping when the
/// rounded size does not fit in a `usize`.
pub fn align_up(value: usize) -> Option<usize> {
  value
    .checked_add(ALIGNMENT - 1)
    .map(|v| v & !(ALIGNMENT - 1))
}

/// Rounds down to the previous multiple of [`ALIGNMENT`].
pub(crate) fn align_down(value: usize) -> usize {
  value & !(ALIGNMENT - 1)
}
