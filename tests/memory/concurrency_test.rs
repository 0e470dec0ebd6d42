/*!
 * Concurrency Tests
 * Independent, unordered callers sharing one engine
 */

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use tlsf_arena::memory::{Allocator, BaselineAllocator, TlsfAllocator};

const THREADS: usize = 8;
const ROUNDS: usize = 2_000;

/// Each thread allocates and frees random sizes, holding a window of live blocks
fn hammer(allocator: Arc<dyn Allocator>, seed: u64, barrier: Arc<Barrier>) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut held = Vec::new();
    barrier.wait();

    for _ in 0..ROUNDS {
        if let Ok(addr) = allocator.allocate(rng.gen_range(16..=2048)) {
            held.push(addr);
        }
        if held.len() > 32 {
            let victim = held.swap_remove(rng.gen_range(0..held.len()));
            allocator.deallocate(victim).unwrap();
        }
    }
    held
}

fn run_threads(allocator: Arc<dyn Allocator>) -> Vec<usize> {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let allocator = allocator.clone();
            let barrier = barrier.clone();
            thread::spawn(move || hammer(allocator, i as u64, barrier))
        })
        .collect();

    handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect()
}

#[test]
fn test_concurrent_callers_keep_engine_consistent() {
    let tlsf = Arc::new(TlsfAllocator::new().unwrap());
    let held = run_threads(tlsf.clone());

    // Every surviving loan is distinct and still live
    let unique: HashSet<_> = held.iter().collect();
    assert_eq!(unique.len(), held.len());
    assert!(held.iter().all(|&a| tlsf.is_live(a)));

    let report = tlsf.check_integrity().unwrap();
    assert_eq!(report.live_blocks, held.len());
    assert_eq!(report.live_bytes + report.free_bytes, report.arena_bytes);

    for addr in held {
        tlsf.free(addr).unwrap();
    }
    assert_eq!(tlsf.free_bytes(), tlsf.arena_size());
    assert_eq!(tlsf.blocks().len(), 1);
}

#[test]
fn test_concurrent_callers_on_baseline() {
    let baseline = Arc::new(BaselineAllocator::new());
    let held = run_threads(baseline.clone());

    assert_eq!(baseline.live_allocations(), held.len());
    for addr in held {
        baseline.free(addr).unwrap();
    }
    assert_eq!(baseline.live_allocations(), 0);
}

#[test]
fn test_racing_double_free_succeeds_once() {
    let tlsf = Arc::new(TlsfAllocator::with_capacity(64 * 1024).unwrap());
    let addr = tlsf.allocate(256).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let successes: usize = (0..THREADS)
        .map(|_| {
            let tlsf = tlsf.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                tlsf.free(addr).is_ok() as usize
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap())
        .sum();

    assert_eq!(successes, 1);
    assert!(tlsf.check_integrity().is_ok());
}
