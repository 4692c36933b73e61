//! Fuzzer module - one-parameter-at-a-time request fuzzing
//!
//! Generators are bound to request parameters, enumerated into a linear
//! sequence of requests, and dispatched to a bounded pool of workers.

mod cancel;
mod engine;
mod enumerator;
pub mod generators;
mod params;
mod registry;
mod results;

pub use cancel::CancelToken;
pub use engine::{Fuzzer, FuzzerConfig, FuzzerState, Outcome, RunSummary};
pub use enumerator::Enumerator;
pub use generators::{Generator, GeneratorKind};
pub use params::ParameterSet;
pub use registry::{Binding, ParamCategory, Registry};
pub use results::{FuzzResult, FuzzResultSet, FuzzResultStats};

/// Fuzzer statistics
#[derive(Debug, Clone, Default)]
pub struct FuzzerStats {
    /// Requests the enumeration is expected to produce
    pub requests_planned: usize,
    /// Requests handed to the worker pool
    pub requests_dispatched: usize,
    /// Outcomes received by the aggregator
    pub requests_completed: usize,
    /// Failed outcomes
    pub errors: usize,
    /// Start time
    pub start_time: Option<std::time::Instant>,
    /// Elapsed time in milliseconds
    pub elapsed_ms: u64,
    /// Completed requests per second
    pub requests_per_second: f64,
}

impl FuzzerStats {
    pub fn progress(&self) -> f64 {
        if self.requests_planned == 0 {
            0.0
        } else {
            self.requests_completed as f64 / self.requests_planned as f64
        }
    }

    fn record_completion(&mut self, failed: bool) {
        self.requests_completed += 1;
        if failed {
            self.errors += 1;
        }
        if let Some(start_time) = self.start_time {
            self.elapsed_ms = start_time.elapsed().as_millis() as u64;
            if self.elapsed_ms > 0 {
                self.requests_per_second =
                    self.requests_completed as f64 / (self.elapsed_ms as f64 / 1000.0);
            }
        }
    }
}
