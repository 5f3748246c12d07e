use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Receives progress of a running batch.
///
/// Called from worker threads, so implementations take `&self` and must be
/// `Sync`.
pub trait ProgressReporter: Send + Sync {
    /// `current` of `total` tasks have been attempted.
    fn progress(&self, current: usize, total: usize);

    /// A named stage of the run is starting. Default: no-op.
    fn stage(&self, _name: &str) {}
}

/// Discards all progress. Used by tests and library callers that do their
/// own reporting.
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {
    fn progress(&self, _current: usize, _total: usize) {}
}

/// Logs progress through the `log` crate.
///
/// Output is throttled to every `throttle_frames` tasks plus the last one,
/// which also reports throughput since construction.
pub struct LogProgressReporter {
    throttle_frames: usize,
    start_time: Instant,
}

impl LogProgressReporter {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            start_time: Instant::now(),
        }
    }

    fn should_log(&self, current: usize, total: usize) -> bool {
        total > 0 && (current % self.throttle_frames == 0 || current == total)
    }
}

impl Default for LogProgressReporter {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressReporter for LogProgressReporter {
    fn progress(&self, current: usize, total: usize) {
        if !self.should_log(current, total) {
            return;
        }
        let pct = current as f64 / total as f64 * 100.0;
        log::info!("Processing: {current}/{total} frames ({pct:.1}%)");
        if current == total {
            let secs = self.start_time.elapsed().as_secs_f64();
            if secs > 0.0 {
                log::info!("Throughput: {:.1} fps", total as f64 / secs);
            }
        }
    }

    fn stage(&self, name: &str) {
        log::info!("{name}");
    }
}

/// Shared attempt counter for one batch.
pub struct ProgressHandle<'a> {
    done: AtomicUsize,
    total: usize,
    reporter: &'a dyn ProgressReporter,
}

impl<'a> ProgressHandle<'a> {
    pub fn new(total: usize, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            reporter,
        }
    }

    /// Counts one more attempted task and returns the new count.
    pub fn advance(&self) -> usize {
        let current = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        self.reporter.progress(current, self.total);
        current
    }

    pub fn current(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn progress(&self, current: usize, total: usize) {
            self.calls.lock().unwrap().push((current, total));
        }
    }

    #[test]
    fn test_null_reporter_is_noop() {
        let reporter = NullProgressReporter;
        reporter.progress(1, 10);
        reporter.stage("Extracting frames");
    }

    #[test]
    fn test_handle_counts_and_reports() {
        let reporter = RecordingReporter::default();
        let handle = ProgressHandle::new(3, &reporter);
        assert_eq!(handle.current(), 0);
        assert_eq!(handle.advance(), 1);
        assert_eq!(handle.advance(), 2);
        assert_eq!(handle.current(), 2);
        assert_eq!(handle.total(), 3);
        assert_eq!(*reporter.calls.lock().unwrap(), vec![(1, 3), (2, 3)]);
    }

    #[test]
    fn test_handle_is_shared_across_threads() {
        let reporter = NullProgressReporter;
        let handle = ProgressHandle::new(400, &reporter);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        handle.advance();
                    }
                });
            }
        });
        assert_eq!(handle.current(), 400);
    }

    #[test]
    fn test_log_reporter_throttle() {
        let reporter = LogProgressReporter::new(10);
        assert!(!reporter.should_log(3, 25));
        assert!(reporter.should_log(10, 25));
        assert!(reporter.should_log(25, 25));
        assert!(!reporter.should_log(0, 0));
    }

    #[test]
    fn test_log_reporter_default_throttle() {
        assert_eq!(LogProgressReporter::default().throttle_frames, 10);
        assert_eq!(LogProgressReporter::new(0).throttle_frames, 1);
    }
}
