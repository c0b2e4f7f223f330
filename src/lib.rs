//! # rpool - A Pool-Backed First-Fit Allocator
//!
//! This crate provides a **pool allocator** that serves malloc/free/realloc
//! style requests out of one arena reserved up front, and keeps running
//! counters for usage reporting and leak detection.
//!
//! ## Overview
//!
//! The arena is partitioned by an address-ordered chain of blocks. Every
//! byte of the pool belongs to exactly one block, and each block is either
//! free or in use:
//!
//! ```text
//!   Pool Layout:
//!
//!   base                                                            base + capacity
//!   ┌────────────┬────────┬──────────────┬────────────────────────────────────┐
//!   │  used 104  │ used 56│   free 96    │              free ...              │
//!   └────────────┴────────┴──────────────┴────────────────────────────────────┘
//!         │           │           │                       ▲
//!         └───► next ─┴──► next ──┴───────► next ─────────┘
//!
//!   Adjacent free blocks never survive a release: they are merged at once.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rpool
//!   ├── align      - Alignment unit and the align! macro
//!   ├── arena      - The reserved byte range (internal)
//!   ├── block      - Block descriptor (internal)
//!   ├── config     - PoolConfig and its builder
//!   ├── error      - PoolError, LedgerFault
//!   ├── ledger     - Block chain: first-fit, split, coalesce (internal)
//!   ├── pool       - PoolAllocator
//!   ├── report     - BlockInfo / BlockReport
//!   └── stats      - Stats counters
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rpool::PoolAllocator;
//!
//! let mut pool = PoolAllocator::new(1024).unwrap();
//!
//! let ptr = pool.allocate(100).unwrap().unwrap();
//! unsafe { ptr.cast::<u64>().write(42) };
//! assert_eq!(pool.stats().current_usage, 104);
//!
//! pool.release(Some(ptr)).unwrap();
//! assert!(!pool.check_leaks());
//!
//! pool.teardown();
//! ```
//!
//! ## How It Works
//!
//! Requests are rounded up to 8 bytes and served by the first free block
//! that is large enough. When that block is much larger than needed, it is
//! split and the tail stays free:
//!
//! ```text
//!   allocate(100):
//!
//!   before  ┌──────────────────────────── free 1024 ───────────────────────────┐
//!   after   ┌── used 104 ──┬──────────────────── free 920 ─────────────────────┐
//! ```
//!
//! The tail is only carved off when it would exceed
//! [`PoolConfig::min_split_remainder`]; smaller leftovers stay attached to
//! the allocation.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `PoolAllocator` is neither `Send` nor `Sync`
//! - **One fixed pool**: the arena never grows and is only returned on teardown
//! - **Linear scans**: allocation and release are O(n) in the block count
//!
//! ## Safety
//!
//! The allocator API itself is safe: addresses are validated against the
//! block ledger before use. Reading or writing through a returned pointer is
//! `unsafe`, and every pointer dangles once the pool is torn down.

pub mod align;
mod arena;
mod block;
mod config;
mod error;
mod ledger;
mod pool;
mod report;
mod stats;

pub use block::BLOCK_OVERHEAD;
pub use config::{DEFAULT_CAPACITY, DEFAULT_MIN_SPLIT_REMAINDER, PoolConfig, PoolConfigBuilder};
pub use error::{LedgerFault, PoolError, Result};
pub use pool::PoolAllocator;
pub use report::{BlockInfo, BlockReport};
pub use stats::Stats;
