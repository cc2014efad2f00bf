// Cooperative progress reporting for long builds
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading records (accumulator feed or generator pass 1).
    Scan,
    /// Enumerating pairs from posting lists (generator pass 2).
    Pairs,
    /// Thresholding, ranking and capping.
    Finalize,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Scan => "scan",
            Phase::Pairs => "pairs",
            Phase::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Receives progress updates from a build.
///
/// Called from the building thread; implementations should be cheap.
pub trait Progress {
    fn update(&self, phase: Phase, done: usize, total: Option<usize>);
}

/// Discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    #[inline]
    fn update(&self, _phase: Phase, _done: usize, _total: Option<usize>) {}
}

impl<F> Progress for F
where
    F: Fn(Phase, usize, Option<usize>),
{
    #[inline]
    fn update(&self, phase: Phase, done: usize, total: Option<usize>) {
        self(phase, done, total)
    }
}

/// Logs through `tracing` every `every` units of work.
#[derive(Debug)]
pub struct TracingProgress {
    every: usize,
    last: AtomicUsize,
}

impl TracingProgress {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            last: AtomicUsize::new(0),
        }
    }
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new(100_000)
    }
}

impl Progress for TracingProgress {
    fn update(&self, phase: Phase, done: usize, total: Option<usize>) {
        let last = self.last.load(Ordering::Relaxed);
        let finished = total.map_or(false, |t| done >= t);
        if done < last || done - last >= self.every || finished {
            self.last.store(done, Ordering::Relaxed);
            match total {
                Some(total) => tracing::debug!(%phase, done, total, "build progress"),
                None => tracing::debug!(%phase, done, "build progress"),
            }
        }
    }
}
