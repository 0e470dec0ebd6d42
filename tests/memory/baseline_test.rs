/*!
 * Baseline Comparator Tests
 */

use pretty_assertions::assert_eq;
use std::collections::HashSet;
use tlsf_arena::memory::{Allocator, BaselineAllocator, MemoryError};

#[test]
fn test_same_contract_as_engine() {
    let baseline = BaselineAllocator::new();
    let allocator: &dyn Allocator = &baseline;

    let addrs: Vec<_> = (1..=100).map(|i| allocator.allocate(i * 40).unwrap()).collect();
    let unique: HashSet<_> = addrs.iter().collect();
    assert_eq!(unique.len(), 100);
    assert_eq!(allocator.name(), "baseline");

    for addr in addrs {
        allocator.deallocate(addr).unwrap();
    }
    assert_eq!(baseline.live_allocations(), 0);
}

#[test]
fn test_unknown_address_rejected() {
    let baseline = BaselineAllocator::new();
    let addr = baseline.allocate(64).unwrap();

    assert_eq!(baseline.free(addr + 8), Err(MemoryError::InvalidPointer(addr + 8)));
    assert_eq!(baseline.live_allocations(), 1);
    baseline.free(addr).unwrap();
}

#[test]
fn test_live_bytes_follow_loans() {
    let baseline = BaselineAllocator::new();
    let a = baseline.allocate(4096).unwrap();
    let b = baseline.allocate(32).unwrap();
    assert!(baseline.live_bytes() >= 4096 + 32);

    baseline.free(a).unwrap();
    assert!(baseline.live_bytes() >= 32);
    baseline.free(b).unwrap();
    assert_eq!(baseline.live_bytes(), 0);
}
