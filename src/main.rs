/*!
 * alloc-bench - Benchmark Driver
 *
 * Usage: alloc-bench <small|mixed> <tlsf|baseline>
 *
 * Runs one workload of 10000 iterations against the chosen backend through
 * the control boundary and prints the elapsed wall time.
 */

use anyhow::{Context, Result};
use std::process::ExitCode;
use tlsf_arena::{
    init_tracing, Backend, BenchConfig, BenchReport, ControlChannel, Dispatcher, FrameChannel,
    Harness, Transport, Workload,
};
use tracing::{error, info};

#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const USAGE: &str = "Usage: alloc-bench <test_type: small|mixed> <allocator: tlsf|baseline>";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [workload, backend] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    // A second subscriber only fails to install; the run goes on without it
    let _ = init_tracing("warn");

    match run(workload, backend) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "benchmark aborted");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(workload: &str, backend: &str) -> Result<()> {
    let workload: Workload = workload.parse().context(USAGE)?;
    let backend: Backend = backend.parse().context(USAGE)?;
    let config = BenchConfig::from_env();
    info!(?config, "benchmark configuration");

    let dispatcher = Dispatcher::new().context("Failed to open the control boundary")?;

    match backend {
        Backend::Tlsf => println!("Testing with TLSF allocator..."),
        Backend::Baseline => println!("Testing with baseline host allocator..."),
    }
    println!(
        "--- Running Test: {} iterations of {} ---",
        tlsf_arena::core::limits::BENCH_ITERATIONS,
        workload.describe()
    );

    let report = match config.transport {
        Transport::Direct => execute(dispatcher, &config, workload, backend)?,
        Transport::Frame => execute(FrameChannel::new(dispatcher), &config, workload, backend)?,
    };

    if config.json_report {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode report")?
        );
    } else {
        if let Some(failure) = &report.first_failure {
            eprintln!(
                "Allocation failed at iteration {} (size {}): {}",
                failure.iteration, failure.size, failure.status
            );
            eprintln!("Failed allocations: {}/{}", report.failed, report.iterations);
        }
        if report.free_failures > 0 {
            eprintln!("Rejected frees: {}", report.free_failures);
        }
        println!("Total time: {} microseconds", report.elapsed_us);
    }
    Ok(())
}

fn execute<C: ControlChannel>(
    channel: C,
    config: &BenchConfig,
    workload: Workload,
    backend: Backend,
) -> Result<BenchReport> {
    Harness::new(channel)
        .with_seed(config.seed)
        .run(workload, backend)
        .context("Control boundary unreachable")
}
