/*!
 * TLSF Engine Tests
 * Allocation, coalescing, pointer validation and teardown
 */

use pretty_assertions::assert_eq;
use tlsf_arena::core::limits::{ALIGNMENT, BLOCK_HEADER_SIZE, DEFAULT_ARENA_SIZE, MIN_ARENA_SIZE};
use tlsf_arena::memory::{MemoryError, MemoryInfo, TlsfAllocator};

const MIB: usize = 1024 * 1024;

fn engine() -> TlsfAllocator {
    TlsfAllocator::new().unwrap()
}

/// Asserts every invariant and that live plus free bytes cover the arena
fn assert_conserved(tlsf: &TlsfAllocator) {
    let report = tlsf.check_integrity().unwrap();
    assert_eq!(report.live_bytes + report.free_bytes, report.arena_bytes);
    assert_eq!(report.free_bytes, tlsf.free_bytes());
}

#[test]
fn test_fresh_engine_is_fully_free() {
    let tlsf = engine();
    let stats = tlsf.stats();

    assert_eq!(tlsf.arena_size(), DEFAULT_ARENA_SIZE);
    assert_eq!(stats.total_memory, 16 * MIB);
    assert_eq!(stats.used_memory, 0);
    assert_eq!(stats.allocated_blocks, 0);
    assert_eq!(stats.free_blocks, 1);
    assert_eq!(stats.largest_free_block, 16 * MIB - BLOCK_HEADER_SIZE);
    assert_conserved(&tlsf);
}

#[test]
fn test_scenario_a_reuse_after_free() {
    let tlsf = engine();
    let a = tlsf.allocate(64).unwrap();
    let b = tlsf.allocate(64).unwrap();
    let c = tlsf.allocate(64).unwrap();

    assert_ne!(a, b);
    assert_ne!(b, c);
    assert_ne!(a, c);
    let mut ranges = [(a, a + 64), (b, b + 64), (c, c + 64)];
    ranges.sort();
    assert!(ranges.windows(2).all(|w| w[0].1 <= w[1].0));

    tlsf.free(b).unwrap();
    let d = tlsf.allocate(64).unwrap();
    assert!(tlsf.is_live(d));
    assert_conserved(&tlsf);

    // The hole left by `b` is the best fit
    assert_eq!(d, b);
}

#[test]
fn test_scenario_b_oversized_request() {
    let tlsf = engine();

    let result = tlsf.allocate(16 * MIB + 1);
    assert!(matches!(
        result,
        Err(MemoryError::OutOfMemory { requested, .. }) if requested == 16 * MIB + 1
    ));
    assert_eq!(tlsf.free_bytes(), 16 * MIB);
    assert_eq!(tlsf.stats().free_blocks, 1);
    assert_conserved(&tlsf);
}

#[test]
fn test_scenario_c_unknown_address() {
    let tlsf = engine();
    let live = tlsf.allocate(256).unwrap();
    let before = tlsf.blocks();

    // Outside the arena, inside a live payload, and inside free space
    let base = before[0].address - BLOCK_HEADER_SIZE;
    for bogus in [0x10, live + 64, base + 8 * MIB] {
        assert_eq!(tlsf.free(bogus), Err(MemoryError::InvalidPointer(bogus)));
    }

    assert_eq!(tlsf.blocks(), before);
    assert!(tlsf.is_live(live));
    assert_conserved(&tlsf);
}

#[test]
fn test_double_free_rejected() {
    let tlsf = engine();
    let a = tlsf.allocate(128).unwrap();
    let _guard = tlsf.allocate(128).unwrap();

    tlsf.free(a).unwrap();
    assert_eq!(tlsf.free(a), Err(MemoryError::InvalidPointer(a)));
    assert_conserved(&tlsf);
}

#[test]
fn test_double_free_after_merge_rejected() {
    let tlsf = engine();
    let a = tlsf.allocate(128).unwrap();
    let b = tlsf.allocate(128).unwrap();

    // `b` merges into `a`, wiping its header
    tlsf.free(a).unwrap();
    tlsf.free(b).unwrap();
    assert_eq!(tlsf.free(b), Err(MemoryError::InvalidPointer(b)));
    assert_eq!(tlsf.free(a), Err(MemoryError::InvalidPointer(a)));
    assert_eq!(tlsf.blocks().len(), 1);
    assert_conserved(&tlsf);
}

#[test]
fn test_alignment_of_every_pointer() {
    let tlsf = engine();
    for size in [0, 1, 7, 15, 16, 17, 33, 100, 255, 256, 257, 1000, 4095, 65537] {
        let addr = tlsf.allocate(size).unwrap();
        assert_eq!(addr % ALIGNMENT, 0, "size {size}");
        assert!(tlsf.usable_size(addr).unwrap() >= size);
    }
    assert_eq!(TlsfAllocator::ALIGNMENT, 16);
    assert_conserved(&tlsf);
}

#[test]
fn test_zero_size_gets_unique_block() {
    let tlsf = engine();
    let a = tlsf.allocate(0).unwrap();
    let b = tlsf.allocate(0).unwrap();

    assert_ne!(a, b);
    assert_eq!(tlsf.usable_size(a).unwrap(), 16);
    tlsf.free(a).unwrap();
    tlsf.free(b).unwrap();
}

#[test]
fn test_good_fit_waste_is_bounded() {
    let tlsf = engine();
    for size in [300, 1000, 5000, 70_000, 1_000_000] {
        let addr = tlsf.allocate(size).unwrap();
        let usable = tlsf.usable_size(addr).unwrap();
        assert!(usable >= size);
        assert!(usable - size <= size / 16 + ALIGNMENT, "size {size} got {usable}");
    }
}

#[test]
fn test_coalesce_restores_single_block() {
    let tlsf = engine();
    let addrs: Vec<_> = (0..64).map(|i| tlsf.allocate(32 + i * 16).unwrap()).collect();

    // Free every other block first, then the rest
    for addr in addrs.iter().step_by(2) {
        tlsf.free(*addr).unwrap();
    }
    assert_conserved(&tlsf);
    for addr in addrs.iter().skip(1).step_by(2) {
        tlsf.free(*addr).unwrap();
    }

    let blocks = tlsf.blocks();
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].is_free);
    assert_eq!(tlsf.free_bytes(), 16 * MIB);
}

#[test]
fn test_exhaustion_and_recovery() {
    let tlsf = TlsfAllocator::with_capacity(64 * 1024).unwrap();
    let mut live = Vec::new();
    while let Ok(addr) = tlsf.allocate(1000) {
        live.push(addr);
    }

    assert!(matches!(
        tlsf.allocate(1000),
        Err(MemoryError::OutOfMemory { .. })
    ));
    assert_conserved(&tlsf);

    for addr in live {
        tlsf.free(addr).unwrap();
    }
    assert_eq!(tlsf.free_bytes(), 64 * 1024);
    assert!(tlsf.allocate(60 * 1024).is_ok());
}

#[test]
fn test_arena_bounds() {
    assert!(matches!(
        TlsfAllocator::with_capacity(MIN_ARENA_SIZE - 1),
        Err(MemoryError::ArenaTooSmall { .. })
    ));

    let tiny = TlsfAllocator::with_capacity(MIN_ARENA_SIZE).unwrap();
    let addr = tiny.allocate(16).unwrap();
    assert!(tiny.allocate(1).is_err());
    tiny.free(addr).unwrap();
}

#[test]
fn test_unaligned_arena_size_is_exact() {
    let tlsf = TlsfAllocator::with_capacity(10_007).unwrap();
    assert_eq!(tlsf.arena_size(), 10_007);
    assert_eq!(tlsf.free_bytes(), 10_007);

    let a = tlsf.allocate(500).unwrap();
    assert_conserved(&tlsf);
    tlsf.free(a).unwrap();
    assert_eq!(tlsf.free_bytes(), 10_007);
}

#[test]
fn test_stats_track_usage() {
    let tlsf = TlsfAllocator::with_capacity(MIB).unwrap();
    let a = tlsf.allocate(1024).unwrap();
    let stats = tlsf.stats();

    assert_eq!(stats.allocated_blocks, 1);
    assert_eq!(stats.used_memory, 1024 + BLOCK_HEADER_SIZE);
    assert_eq!(stats.available_memory, MIB - 1024 - BLOCK_HEADER_SIZE);
    assert_eq!(tlsf.info(), (MIB, 1024 + BLOCK_HEADER_SIZE, MIB - 1024 - BLOCK_HEADER_SIZE));
    tlsf.free(a).unwrap();
}

#[test]
fn test_destroy_reports_outstanding() {
    let tlsf = TlsfAllocator::with_capacity(MIB).unwrap();
    tlsf.allocate(100).unwrap();
    tlsf.allocate(200).unwrap();

    let stats = tlsf.destroy();
    assert_eq!(stats.allocated_blocks, 2);
    assert_eq!(stats.total_memory, MIB);
}
