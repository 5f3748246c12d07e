use std::path::Path;

use crate::shared::frame::Frame;

/// Loads a stored frame (an extracted video frame or a still image).
pub trait FrameSource: Send + Sync {
    fn load(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
