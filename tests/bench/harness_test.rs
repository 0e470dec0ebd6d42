/*!
 * Benchmark Harness Tests
 * Workload runs end to end through both transports
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::collections::HashSet;
use std::sync::Arc;
use tlsf_arena::bench::{BenchReport, Harness, Workload};
use tlsf_arena::control::{Backend, Dispatcher, FrameChannel};
use tlsf_arena::core::limits::BENCH_ITERATIONS;
use tlsf_arena::memory::{BaselineAllocator, TlsfAllocator};

#[test]
fn test_scenario_d_mixed_workload_on_engine() {
    let dispatcher = Dispatcher::new().unwrap();
    let tlsf = dispatcher.tlsf().clone();
    let initial_free = tlsf.free_bytes();
    let harness = Harness::new(dispatcher).with_seed(7);

    let sizes = harness.sizes(Workload::MixedSize);
    assert_eq!(sizes.len(), BENCH_ITERATIONS);
    assert!(sizes.iter().all(|s| (32..=4096).contains(s)));

    let phase = harness.allocate_phase(Backend::Tlsf, &sizes).unwrap();

    // All non-failed allocations are disjoint while live
    let mut ranges: Vec<_> = phase
        .pointers
        .iter()
        .zip(&sizes)
        .filter(|&(&p, _)| p != 0)
        .map(|(&p, &s)| (p, p + s))
        .collect();
    ranges.sort_unstable();
    assert!(ranges.windows(2).all(|w| w[0].1 <= w[1].0));
    assert_eq!(ranges.len(), phase.succeeded());
    assert!(tlsf.check_integrity().is_ok());

    assert_eq!(harness.free_phase(Backend::Tlsf, &phase).unwrap(), 0);
    assert_eq!(tlsf.free_bytes(), initial_free);
    assert_eq!(tlsf.blocks().len(), 1);
}

#[test]
fn test_mixed_workload_overflows_arena() {
    // ~20 MiB of requests against a 16 MiB arena: some must fail, none abort the run
    let harness = Harness::new(Dispatcher::new().unwrap());
    let report = harness.run(Workload::MixedSize, Backend::Tlsf).unwrap();

    assert_eq!(report.iterations, BENCH_ITERATIONS);
    assert_eq!(report.succeeded + report.failed, BENCH_ITERATIONS);
    assert!(report.failed > 0);
    assert!(report.first_failure.is_some());
    assert_eq!(report.free_failures, 0);
}

#[test]
fn test_uniform_workload_on_both_backends() {
    for backend in [Backend::Tlsf, Backend::Baseline] {
        let harness = Harness::new(Dispatcher::new().unwrap());
        let report = harness.run(Workload::UniformSmall, backend).unwrap();

        assert_eq!(report.backend, backend);
        assert_eq!(report.workload, Workload::UniformSmall);
        assert_eq!(report.succeeded, BENCH_ITERATIONS);
        assert!(report.all_succeeded());
        assert_eq!(report.transport, "direct");
    }
}

#[test]
fn test_frame_transport_matches_direct() {
    let tlsf = Arc::new(TlsfAllocator::new().unwrap());
    let baseline = Arc::new(BaselineAllocator::new());
    let dispatcher = Dispatcher::with_backends(tlsf.clone(), baseline);

    let direct = Harness::new(dispatcher.clone())
        .with_iterations(500)
        .run(Workload::MixedSize, Backend::Tlsf)
        .unwrap();
    let framed = Harness::new(FrameChannel::new(dispatcher))
        .with_iterations(500)
        .run(Workload::MixedSize, Backend::Tlsf)
        .unwrap();

    assert_eq!(framed.transport, "frame");
    assert_eq!(framed.succeeded, direct.succeeded);
    assert_eq!(framed.failed, direct.failed);
    assert_eq!(tlsf.free_bytes(), tlsf.arena_size());
}

#[test]
fn test_harness_pointers_are_unique() {
    let harness = Harness::new(Dispatcher::new().unwrap()).with_iterations(1000);
    let sizes = harness.sizes(Workload::UniformSmall);

    let phase = harness.allocate_phase(Backend::Baseline, &sizes).unwrap();
    let unique: HashSet<_> = phase.live().collect();
    assert_eq!(unique.len(), 1000);
    assert_eq!(harness.free_phase(Backend::Baseline, &phase).unwrap(), 0);
}

#[test]
fn test_report_serializes() {
    let harness = Harness::new(Dispatcher::new().unwrap()).with_iterations(10);
    let report = harness.run(Workload::UniformSmall, Backend::Tlsf).unwrap();

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"workload\":\"uniform_small\""));
    assert!(json.contains("\"backend\":\"tlsf\""));

    let back: BenchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
    assert!(report.to_string().starts_with("--- 10 x small on tlsf"));
}

#[test]
#[serial]
fn test_run_with_tracing_installed() {
    // Only the first call in the process installs a subscriber
    let _ = tlsf_arena::init_tracing("debug");
    assert!(tlsf_arena::init_tracing("debug").is_err());

    let harness = Harness::new(Dispatcher::new().unwrap()).with_iterations(100);
    let report = harness.run(Workload::MixedSize, Backend::Baseline).unwrap();
    assert!(report.all_succeeded());
}
