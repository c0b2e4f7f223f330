use std::{env, io::Read, ptr::NonNull};

use rpool::{PoolAllocator, Result};

/// Waits until the user presses ENTER, unless `--no-pause` was given.
/// Useful to read the block table before the next step changes it.
fn block_until_enter_pressed(pause: bool) {
  if !pause {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// What the shell prints for its `memstat` built-in.
fn memstat(pool: &PoolAllocator) {
  println!("\n{}", pool.stats());
  println!("\n{}", pool.dump_blocks());
}

fn print_alloc(
  label: &str,
  pool: &PoolAllocator,
  addr: NonNull<u8>,
) {
  println!(
    "[{}] address = {:?} (base + {}), in use = {} / {} bytes",
    label,
    addr,
    addr.as_ptr() as usize - pool.base_address(),
    pool.used(),
    pool.capacity()
  );
}

fn main() -> Result<()> {
  env_logger::init();

  let pause = !env::args().any(|arg| arg == "--no-pause");

  // A 1 KiB pool: small enough that every split is visible in the table.
  let mut pool = PoolAllocator::new(1024)?;

  println!("[start] pool of {} bytes at {:#x}", pool.capacity(), pool.base_address());
  memstat(&pool);
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 1) Allocate 100 bytes. The request is rounded up to 104 and carved
  //    off the front of the single free block.
  // --------------------------------------------------------------------
  let Some(first) = pool.allocate(100)? else {
    unreachable!("non-zero requests always return an address")
  };
  print_alloc("1", &pool, first);

  unsafe { first.cast::<u64>().write(0xDEADBEEF) };
  println!("[1] Value written = 0x{:X}", unsafe { first.cast::<u64>().read() });

  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 2) Allocate 50 bytes right behind it.
  // --------------------------------------------------------------------
  let second = pool.allocate(50)?;
  if let Some(addr) = second {
    print_alloc("2", &pool, addr);
  }
  memstat(&pool);
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 3) Release the first block and ask for 96 bytes: first-fit hands the
  //    same region back instead of growing into the tail.
  // --------------------------------------------------------------------
  pool.release(Some(first))?;
  let third = pool.allocate(96)?;
  if let Some(addr) = third {
    print_alloc("3", &pool, addr);
    println!(
      "[3] third == first? {}",
      if addr == first {
        "Yes, it reused the freed block"
      } else {
        "No, it allocated somewhere else"
      }
    );
  }
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 4) Grow the third block past its size: it moves, its bytes follow.
  // --------------------------------------------------------------------
  let moved = pool.resize(third, 400)?;
  if let Some(addr) = moved {
    print_alloc("4", &pool, addr);
    println!("[4] Value carried over = 0x{:X}", unsafe { addr.cast::<u64>().read() });
  }
  memstat(&pool);
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 5) Ask for more than is left.
  // --------------------------------------------------------------------
  match pool.allocate(4096) {
    Ok(_) => println!("\n[5] Unexpectedly served 4096 bytes"),
    Err(err) => println!("\n[5] {}", err),
  }
  block_until_enter_pressed(pause);

  // --------------------------------------------------------------------
  // 6) `memcheck`: `second` is still live, so a leak is reported.
  //    Releasing it clears the report.
  // --------------------------------------------------------------------
  println!("\n[6] leak detected? {}", pool.check_leaks());
  pool.release(moved)?;
  pool.release(second)?;
  println!("[6] leak detected after releasing everything? {}", pool.check_leaks());
  memstat(&pool);

  println!("\n[7] End of example. Tearing the pool down.");
  pool.teardown();

  Ok(())
}
