use crate::{
  align::ALIGNMENT,
  block::{Block, BlockId},
  error::LedgerFault,
};

/// Address-ordered chain of block descriptors tiling the pool.
///
/// ```text
///   slots:  [0]──────►[2]──────►[1]──────► None
///           off 0      off 104   off 160
///           used       used      free
///
///   vacant: [3]   (recycled by the next split)
/// ```
///
/// Descriptors live in `slots` and link to each other by index, so merging
/// two blocks only has to push the dead slot on `vacant`.
pub(crate) struct Ledger {
  slots: Vec<Block>,
  vacant: Vec<BlockId>,
  head: Option<BlockId>,
  len: usize,
}

impl Ledger {
  /// Creates a ledger holding one free block that spans the whole pool.
  pub fn new(capacity: usize) -> Self {
    Self {
      slots: vec![Block::new(0, capacity, true, None)],
      vacant: Vec::new(),
      head: Some(0),
      len: 1,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn get(
    &self,
    id: BlockId,
  ) -> &Block {
    &self.slots[id]
  }

  pub fn get_mut(
    &mut self,
    id: BlockId,
  ) -> &mut Block {
    &mut self.slots[id]
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      ledger: self,
      current: self.head,
    }
  }

  /// First-fit: the lowest-offset free block holding at least `size` bytes.
  pub fn find_free_block(
    &self,
    size: usize,
  ) -> Option<BlockId> {
    self
      .iter()
      .find(|(_, block)| block.is_free && block.size >= size)
      .map(|(id, _)| id)
  }

  /// The allocated block starting exactly at `offset`.
  pub fn find_allocated(
    &self,
    offset: usize,
  ) -> Option<BlockId> {
    self
      .iter()
      .take_while(|(_, block)| block.offset <= offset)
      .find(|(_, block)| block.offset == offset && !block.is_free)
      .map(|(id, _)| id)
  }

  pub fn largest_free(&self) -> usize {
    self
      .iter()
      .filter(|(_, block)| block.is_free)
      .map(|(_, block)| block.size)
      .max()
      .unwrap_or(0)
  }

  /// Shrinks block `id` to `size` bytes and links a free block covering the
  /// rest right after it, but only when more than `min_remainder` bytes
  /// would be left over. Returns the size of the carved remainder.
  pub fn split(
    &mut self,
    id: BlockId,
    size: usize,
    min_remainder: usize,
  ) -> Option<usize> {
    let block = self.slots[id];

    if block.size <= size.saturating_add(min_remainder) {
      return None;
    }

    let remainder = Block::new(block.offset + size, block.size - size, true, block.next);
    let remainder_size = remainder.size;
    let remainder_id = self.insert(remainder);

    let block = &mut self.slots[id];
    block.size = size;
    block.next = Some(remainder_id);

    Some(remainder_size)
  }

  /// Merges every run of adjacent free blocks into its first block.
  /// Returns how many descriptors were discarded.
  pub fn coalesce(&mut self) -> usize {
    let mut merged = 0;
    let mut current = self.head;

    while let Some(id) = current {
      let Some(next_id) = self.slots[id].next else {
        break;
      };
      let next = self.slots[next_id];

      if self.slots[id].is_free && next.is_free {
        let block = &mut self.slots[id];
        block.size += next.size;
        block.next = next.next;

        self.vacant.push(next_id);
        self.len -= 1;
        merged += 1;
      } else {
        current = Some(next_id);
      }
    }

    merged
  }

  /// Checks that the chain tiles `[0, capacity)` with aligned, non-empty
  /// blocks and that no two neighbours are both free.
  pub fn verify(
    &self,
    capacity: usize,
  ) -> Result<(), LedgerFault> {
    let mut expected = 0;
    let mut previous: Option<&Block> = None;

    for (_, block) in self.iter() {
      if block.offset != expected {
        return Err(LedgerFault::Gap {
          offset: block.offset,
          expected,
        });
      }
      if block.size == 0 || block.size % ALIGNMENT != 0 {
        return Err(LedgerFault::BadSize {
          offset: block.offset,
          size: block.size,
        });
      }
      if let Some(prev) = previous {
        if prev.is_free && block.is_free {
          return Err(LedgerFault::AdjacentFree {
            first: prev.offset,
            second: block.offset,
          });
        }
      }

      expected = block.end();
      previous = Some(block);
    }

    if expected != capacity {
      return Err(LedgerFault::Coverage {
        covered: expected,
        capacity,
      });
    }

    Ok(())
  }

  fn insert(
    &mut self,
    block: Block,
  ) -> BlockId {
    self.len += 1;

    match self.vacant.pop() {
      Some(id) => {
        self.slots[id] = block;
        id
      }
      None => {
        self.slots.push(block);
        self.slots.len() - 1
      }
    }
  }
}

/// Walks the chain from the head in ascending offset order.
pub(crate) struct Iter<'a> {
  ledger: &'a Ledger,
  current: Option<BlockId>,
}

impl<'a> Iterator for Iter<'a> {
  type Item = (BlockId, &'a Block);

  fn next(&mut self) -> Option<Self::Item> {
    let id = self.current?;
    let block = &self.ledger.slots[id];
    self.current = block.next;

    Some((id, block))
  }
}
