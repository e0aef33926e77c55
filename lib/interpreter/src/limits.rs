use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use crate::RuntimeError;

/// Shared flag another thread can trip to stop a running program at its next loop iteration.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a single run. The default is unbounded.
#[derive(Debug, Clone, Default)]
pub struct Limits {
    max_iterations: Option<u64>,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl Limits {
    /// Total number of loop iterations, summed over every loop in the program.
    pub fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Wall-clock budget, measured from the start of execution.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Tracks a run's progress against its `Limits`.
#[derive(Debug)]
pub(crate) struct Budget {
    limits: Limits,
    iterations: u64,
    started: Instant,
}

impl Budget {
    pub fn new(limits: Limits) -> Self {
        Self { limits, iterations: 0, started: Instant::now() }
    }

    pub fn start(&mut self) {
        self.iterations = 0;
        self.started = Instant::now();
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Called once per loop iteration, before the body runs.
    pub fn tick(&mut self) -> Result<(), RuntimeError> {
        if self.limits.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(RuntimeError::Cancelled);
        }

        self.iterations += 1;
        if let Some(max) = self.limits.max_iterations {
            if self.iterations > max {
                return Err(RuntimeError::IterationLimitExceeded(max));
            }
        }

        if let Some(timeout) = self.limits.timeout {
            if self.started.elapsed() > timeout {
                return Err(RuntimeError::TimedOut(timeout));
            }
        }

        Ok(())
    }
}
