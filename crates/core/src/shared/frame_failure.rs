use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// A unit of per-frame work that failed, kept for the run summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FrameFailure {
    pub path: PathBuf,
    pub message: String,
}

impl FrameFailure {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FrameFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
