use crate::pipeline::frame_processor::BatchReport;
use crate::shared::frame_failure::FrameFailure;

/// Outcome of a whole swap run.
///
/// Frame counts describe the swap pass. Target analysis only records how
/// many frames it analysed, and every failed frame is listed once, with the
/// first error it hit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub processed: usize,
    pub no_face: usize,
    pub skipped: usize,
    pub analysed: usize,
    pub failures: Vec<FrameFailure>,
}

impl RunSummary {
    /// Adds the swap pass.
    pub fn absorb(&mut self, report: BatchReport) {
        self.processed += report.processed;
        self.no_face += report.no_face;
        self.skipped += report.skipped;
        for failure in report.failures {
            self.record_failure(failure);
        }
    }

    /// Adds the target analysis pass.
    pub fn absorb_analysis(&mut self, report: BatchReport) {
        self.analysed += report.succeeded();
        for failure in report.failures {
            self.record_failure(failure);
        }
    }

    pub fn record_failure(&mut self, failure: FrameFailure) {
        if self.failures.iter().any(|f| f.path == failure.path) {
            log::debug!("{failure} (already failed earlier)");
            return;
        }
        self.failures.push(failure);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped == 0
    }

    pub fn summary_string(&self) -> String {
        let mut text = format!(
            "Run summary: {} processed, {} without faces, {} failed",
            self.processed,
            self.no_face,
            self.failures.len()
        );
        if self.skipped > 0 {
            text.push_str(&format!(", {} skipped", self.skipped));
        }
        if self.analysed > 0 {
            text.push_str(&format!(" ({} frames analysed for mapping)", self.analysed));
        }
        for failure in &self.failures {
            text.push_str(&format!("\n  {failure}"));
        }
        text
    }

    pub fn log(&self) {
        if self.is_clean() {
            log::info!("{}", self.summary_string());
        } else {
            log::warn!("{}", self.summary_string());
        }
    }
}
