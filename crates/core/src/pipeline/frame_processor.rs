use std::fmt;
use std::str::FromStr;

use crate::shared::frame_failure::FrameFailure;

/// What a batch does when one of its frames fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep processing the other frames.
    #[default]
    BestEffort,
    /// Record the failure and skip every frame not yet started.
    Abort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BestEffort => "best-effort",
            Self::Abort => "abort",
        })
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best-effort" => Ok(Self::BestEffort),
            "abort" => Ok(Self::Abort),
            other => Err(format!(
                "unknown failure policy '{other}'; expected best-effort or abort"
            )),
        }
    }
}

/// Result of a per-frame transform that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Processed,
    /// The frame held no face to work on. Not an error.
    NoFace,
}

/// Tally of one batch of per-frame tasks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub processed: usize,
    pub no_face: usize,
    pub failures: Vec<FrameFailure>,
    /// Tasks never started because of cancellation or [`FailurePolicy::Abort`].
    pub skipped: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.processed + self.no_face
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded() + self.failed()
    }
}
