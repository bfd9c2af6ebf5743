//! Progress callbacks for per-face loops over large surfaces.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use mantle::algo::Progress;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let seen = calls.clone();
//! let progress = Progress::new(move |_done, _total| {
//!     seen.fetch_add(1, Ordering::Relaxed);
//! })
//! .with_interval(10);
//!
//! for i in 0..25 {
//!     progress.tick(i, 25);
//! }
//! // Steps 0, 10 and 20
//! assert_eq!(calls.load(Ordering::Relaxed), 3);
//! ```

/// Default number of steps between two reports.
pub const DEFAULT_INTERVAL: usize = 1000;

/// A throttled progress callback.
///
/// The callback receives the current step (0-based) and the total number of
/// steps. [`tick`](Self::tick) forwards only every `interval`-th step.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize) + Send + Sync>,
    interval: usize,
}

impl Progress {
    /// Create a progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Report through the `log` facade at info level.
    pub fn logging(label: &'static str) -> Self {
        Self::new(move |current, total| log::info!("{}: {}/{}", label, current, total))
    }

    /// A reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _| {})
    }

    /// Set the number of steps between reports (at least 1).
    pub fn with_interval(mut self, interval: usize) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Steps between reports.
    #[inline]
    pub fn interval(&self) -> usize {
        self.interval
    }

    /// Report step `current` of `total` if it falls on the interval.
    #[inline]
    pub fn tick(&self, current: usize, total: usize) {
        if current % self.interval == 0 {
            (self.callback)(current, total);
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
