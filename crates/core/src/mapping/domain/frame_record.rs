use std::path::PathBuf;

use serde::Serialize;

use crate::shared::detected_face::DetectedFace;

/// The faces found in one stored frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameRecord {
    pub index: usize,
    pub path: PathBuf,
    pub faces: Vec<DetectedFace>,
}

impl FrameRecord {
    pub fn new(index: usize, path: impl Into<PathBuf>, faces: Vec<DetectedFace>) -> Self {
        Self {
            index,
            path: path.into(),
            faces,
        }
    }

    /// A frame that could not be read or analysed.
    pub fn empty(index: usize, path: impl Into<PathBuf>) -> Self {
        Self::new(index, path, Vec::new())
    }
}
