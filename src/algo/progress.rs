//! Progress reporting for long-running operations.
//!
//! Pipeline entry points with a `_with_progress` suffix take a [`Progress`]
//! and call it once per stage.
//!
//! # Example
//!
//! ```
//! use unfold::algo::unwrap::{unwrap_with_progress, UnwrapOptions};
//! use unfold::algo::Progress;
//! use unfold::mesh::primitives;
//!
//! let progress = Progress::new(|current, total, message| {
//!     println!("[{}/{}] {}", current, total, message);
//! });
//!
//! let mesh = primitives::cube();
//! unwrap_with_progress(&mesh, &UnwrapOptions::default(), &progress).unwrap();
//! ```

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Current step (0-based)
/// - `total`: Total number of steps
/// - `message`: Description of the current operation
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Report progress within a sub-range.
    ///
    /// Maps progress from `[0, sub_total]` to `[range_current, range_current + 1]`
    /// within a total of `range_total` steps. This enables hierarchical progress
    /// where sub-operations report their progress within an allocated slice.
    ///
    /// # Example
    ///
    /// ```
    /// # use unfold::algo::Progress;
    /// # let progress = Progress::none();
    /// # let (islands_done, num_islands) = (3, 10);
    /// // Six stages; stage 3 parameterizes islands one by one.
    /// progress.report_sub(islands_done, num_islands, 3, 6, "Parameterizing islands");
    /// ```
    #[inline]
    pub fn report_sub(
        &self,
        sub_current: usize,
        sub_total: usize,
        range_current: usize,
        range_total: usize,
        message: &str,
    ) {
        if sub_total == 0 || range_total == 0 {
            return;
        }
        // Fixed point, 1000 sub-steps per step.
        let sub_fraction = (sub_current * 1000) / sub_total;
        let effective = range_current * 1000 + sub_fraction;
        let total_scaled = range_total * 1000;
        (self.callback)(effective, total_scaled, message);
    }

    /// A reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
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
    fn test_report_sub_scales_into_stage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, _| sink.lock().unwrap().push((current, total)));

        progress.report_sub(1, 4, 3, 6, "stage");
        progress.report_sub(1, 0, 3, 6, "ignored");

        assert_eq!(*seen.lock().unwrap(), vec![(3250, 6000)]);
    }
}
