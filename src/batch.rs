//! Fan-out of a per-repository operation over the working set.
//!
//! Each repository is handled independently: one failing repository never
//! stops the others. With `jobs == 1` repositories run one after another in
//! input order; with more jobs they run on a bounded `rayon` pool. Either way
//! results come back in input order.
//!
//! A [`CancellationToken`] is checked before each repository starts. A
//! repository already in flight always runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::logging::Logger;

/// How a per-repository operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Succeeded,
    Skipped,
    Failed,
}

/// Implemented by per-repository outcome types so they can be summarized.
pub trait Outcome {
    fn kind(&self) -> OutcomeKind;
}

/// Shared flag checked between repositories.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BatchRunner {
    jobs: usize,
    cancel: CancellationToken,
    logger: Logger,
}

impl BatchRunner {
    pub fn new(jobs: usize, logger: Logger) -> Self {
        Self {
            jobs: jobs.max(1),
            cancel: CancellationToken::new(),
            logger,
        }
    }

    pub fn sequential(logger: Logger) -> Self {
        Self::new(1, logger)
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Applies `op` to every item. Items not started because of cancellation
    /// yield `Err(Error::Cancelled)`.
    pub fn run<T, R, F>(&self, items: &[T], op: F) -> Vec<Result<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync,
    {
        let guarded = |item: &T| {
            if self.cancel.is_cancelled() {
                Err(Error::Cancelled)
            } else {
                Ok(op(item))
            }
        };

        if self.jobs == 1 || items.len() < 2 {
            return items.iter().map(guarded).collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
        {
            Ok(pool) => pool.install(|| items.par_iter().map(guarded).collect()),
            Err(e) => {
                self.logger.warn(format_args!(
                    "Could not start {} workers ({}), running sequentially",
                    self.jobs, e
                ));
                items.iter().map(guarded).collect()
            }
        }
    }
}

/// Counts per outcome kind for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn from_results<R: Outcome>(results: &[Result<R>]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result {
                Ok(outcome) => match outcome.kind() {
                    OutcomeKind::Succeeded => summary.succeeded += 1,
                    OutcomeKind::Skipped => summary.skipped += 1,
                    OutcomeKind::Failed => summary.failed += 1,
                },
                Err(Error::Cancelled) => summary.cancelled += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed + self.cancelled
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} failed",
            self.succeeded, self.skipped, self.failed
        )?;
        if self.cancelled > 0 {
            write!(f, ", {} cancelled", self.cancelled)?;
        }
        Ok(())
    }
}
