//! Timing instrumentation for the pipeline's entry points

use std::time::Instant;

/// Runs `operation`, then logs how long it took.
///
/// Logged regardless of whether the closure returned an error.
pub(crate) fn timed<T>(name: &'static str, operation: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = operation();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::info!(operation = name, elapsed_ms, "Execution time of {}: {} ms", name, elapsed_ms);

    result
}
