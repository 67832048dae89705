//! Progress callbacks for long-running operations.
//!
//! ```
//! use edgefold::algo::progress::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     eprintln!("{}: {}/{}", message, current, total);
//! });
//! progress.report(3, 10, "Collapsing edges");
//! ```

/// Receives `(current, total, message)` updates.
///
/// `current` counts completed units of work out of `total`; the unit depends
/// on the operation (edges removed, subdivision passes, ...).
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// A reporter that ignores every update.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report `sub_current / sub_total` of step `step` out of `steps`.
    ///
    /// The callback sees a single scale of `steps * 1000` units, so nested
    /// loops still produce one monotonic bar.
    pub fn report_sub(&self, sub_current: usize, sub_total: usize, step: usize, steps: usize, message: &str) {
        if sub_total == 0 || steps == 0 {
            return;
        }
        let fraction = (sub_current.min(sub_total) * 1000) / sub_total;
        (self.callback)(step * 1000 + fraction, steps * 1000, message);
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_sub_scales_into_step() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, _| {
            sink.lock().unwrap().push((current, total));
        });

        progress.report_sub(1, 2, 1, 3, "pass");
        progress.report_sub(5, 0, 0, 3, "ignored");
        progress.report(4, 8, "plain");

        assert_eq!(*seen.lock().unwrap(), vec![(1500, 3000), (4, 8)]);
    }
}
