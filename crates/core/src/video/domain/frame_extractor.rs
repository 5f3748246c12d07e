use std::path::Path;

use crate::shared::video_metadata::VideoMetadata;

/// Splits a video into numbered image files.
///
/// Frames are written as `0001.png`, `0002.png`, ... in decode order; the
/// number grows past four digits for long videos, so the timeline is the
/// numeric order of the file stems.
pub trait FrameExtractor: Send {
    fn extract(
        &self,
        video_path: &Path,
        output_dir: &Path,
    ) -> Result<VideoMetadata, Box<dyn std::error::Error>>;
}
