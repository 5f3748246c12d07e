use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::pipeline::frame_processor::{BatchReport, FailurePolicy, FrameOutcome};
use crate::pipeline::progress::ProgressHandle;
use crate::shared::frame_failure::FrameFailure;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Runs a per-frame transform over many frame files on a fixed pool of
/// worker threads.
///
/// Layout: `feeder → bounded channel → N workers`
///
/// Each path is one task. Errors and panics are caught per task and
/// recorded; the batch always runs to completion (or to the point the
/// failure policy or cancel token stops it) and returns a [`BatchReport`].
/// No ordering is guaranteed between frames.
pub struct ParallelFrameProcessor {
    workers: usize,
    policy: FailurePolicy,
    cancelled: Arc<AtomicBool>,
    channel_capacity: usize,
}

impl ParallelFrameProcessor {
    pub fn new(workers: usize, policy: FailurePolicy) -> Self {
        Self {
            workers: workers.max(1),
            policy,
            cancelled: Arc::new(AtomicBool::new(false)),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Checked at the start of every task; once set, remaining tasks are
    /// skipped.
    pub fn with_cancel_token(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Applies `transform` to every path. `progress` advances once per
    /// attempted task, whether it succeeded or failed.
    pub fn run<C, F>(
        &self,
        context: &C,
        paths: &[PathBuf],
        progress: &ProgressHandle<'_>,
        transform: F,
    ) -> BatchReport
    where
        C: Sync + ?Sized,
        F: Fn(&C, &[PathBuf], &ProgressHandle<'_>) -> Result<FrameOutcome, Box<dyn std::error::Error>>
            + Sync,
    {
        let workers = self.workers.min(paths.len()).max(1);
        let (task_tx, task_rx) = crossbeam_channel::bounded::<&PathBuf>(self.channel_capacity);

        let processed = AtomicUsize::new(0);
        let no_face = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let failures: Mutex<Vec<FrameFailure>> = Mutex::new(Vec::new());
        let aborted = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let transform = &transform;
                let (processed, no_face, skipped) = (&processed, &no_face, &skipped);
                let (failures, aborted) = (&failures, &aborted);
                scope.spawn(move || {
                    for path in task_rx {
                        if self.cancelled.load(Ordering::Relaxed) || aborted.load(Ordering::Relaxed) {
                            skipped.fetch_add(1, Ordering::Relaxed);
                            continue;
                        }

                        let result = catch_unwind(AssertUnwindSafe(|| {
                            transform(context, std::slice::from_ref(path), progress)
                        }));
                        let message = match result {
                            Ok(Ok(FrameOutcome::Processed)) => {
                                processed.fetch_add(1, Ordering::Relaxed);
                                None
                            }
                            Ok(Ok(FrameOutcome::NoFace)) => {
                                no_face.fetch_add(1, Ordering::Relaxed);
                                None
                            }
                            Ok(Err(e)) => Some(e.to_string()),
                            Err(panic) => Some(format!("panicked: {}", panic_message(&*panic))),
                        };

                        if let Some(message) = message {
                            log::warn!("Frame {} failed: {message}", path.display());
                            failures
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .push(FrameFailure::new(path, message));
                            if self.policy == FailurePolicy::Abort {
                                aborted.store(true, Ordering::Relaxed);
                            }
                        }
                        progress.advance();
                    }
                });
            }
            drop(task_rx);

            for path in paths {
                if task_tx.send(path).is_err() {
                    break;
                }
            }
            drop(task_tx);
        });

        let mut failures = failures.into_inner().unwrap_or_else(|e| e.into_inner());
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        let report = BatchReport {
            processed: processed.into_inner(),
            no_face: no_face.into_inner(),
            failures,
            skipped: skipped.into_inner(),
        };
        if report.skipped > 0 {
            log::warn!("Skipped {} of {} frames", report.skipped, paths.len());
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
