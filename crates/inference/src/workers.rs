//! Worker count resolution.
//!
//! `NUM_WORKERS` is a number with two sentinel forms:
//! - `-1` means one worker per logical core
//! - a value strictly between 0 and 1 means that fraction of the cores
//!
//! Anything else is truncated toward zero and used as-is, including 0 and
//! negative values. Callers validate the result before sizing a pool with it.

use std::num::NonZeroUsize;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkerSpec {
    AllCores,
    Fraction(f64),
    Count(i64),
}

impl WorkerSpec {
    pub fn from_raw(raw: Option<f64>) -> Option<Self> {
        let raw = raw?;

        if raw == -1.0 {
            Some(Self::AllCores)
        } else if raw > 0.0 && raw < 1.0 {
            Some(Self::Fraction(raw))
        } else {
            // `as` truncates toward zero, saturates at the bounds and maps NaN to 0
            Some(Self::Count(raw as i64))
        }
    }

    pub fn resolve(self, cores: usize) -> i64 {
        match self {
            Self::AllCores => cores as i64,
            Self::Fraction(fraction) => (fraction * cores as f64) as i64,
            Self::Count(count) => count,
        }
    }
}

/// Resolve a raw worker setting against `cores` logical cores.
pub fn resolve_worker_count(raw: Option<f64>, cores: usize) -> Option<i64> {
    WorkerSpec::from_raw(raw).map(|spec| spec.resolve(cores))
}

/// Logical cores available to this process, queried on every call.
pub fn available_cores() -> usize {
    match thread::available_parallelism() {
        Ok(cores) => cores.get(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine available cores, assuming 1");
            NonZeroUsize::MIN.get()
        }
    }
}
