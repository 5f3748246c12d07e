use std::path::PathBuf;

use crate::content::domain::content_classifier::ContentClassifier;
use crate::shared::constants::{NSFW_MAX_PROBABILITY, NSFW_VIDEO_FRAME_INTERVAL};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// Screens targets before any swapping starts.
pub struct NsfwFilter<'a> {
    classifier: &'a dyn ContentClassifier,
    threshold: f32,
    frame_interval: usize,
}

impl<'a> NsfwFilter<'a> {
    pub fn new(classifier: &'a dyn ContentClassifier) -> Self {
        Self {
            classifier,
            threshold: NSFW_MAX_PROBABILITY,
            frame_interval: NSFW_VIDEO_FRAME_INTERVAL,
        }
    }

    pub fn check_image(&self, frame: &Frame) -> Result<bool, Box<dyn std::error::Error>> {
        let probability = self.classifier.nsfw_probability(frame)?;
        log::debug!("NSFW probability {probability:.3}");
        Ok(probability > self.threshold)
    }

    /// Classifies every Nth extracted frame, starting with the first.
    /// Stops at the first positive. Unreadable frames are skipped.
    pub fn check_video(
        &self,
        frame_paths: &[PathBuf],
        frames: &dyn FrameSource,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        for path in frame_paths.iter().step_by(self.frame_interval.max(1)) {
            let frame = match frames.load(path) {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Skipping {} in NSFW check: {e}", path.display());
                    continue;
                }
            };
            if self.check_image(&frame)? {
                log::info!("NSFW content detected in {}", path.display());
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    /// Returns the frame's first byte as a probability out of 100 and
    /// records every frame index it saw.
    #[derive(Default)]
    struct ByteClassifier {
        seen: Mutex<Vec<usize>>,
    }

    impl ContentClassifier for ByteClassifier {
        fn nsfw_probability(&self, frame: &Frame) -> Result<f32, Box<dyn std::error::Error>> {
            self.seen.lock().unwrap().push(frame.index());
            Ok(frame.data()[0] as f32 / 100.0)
        }
    }

    /// Frame N (from `N.png`) is explicit only when N is in `explicit`.
    struct NumberedFrames {
        explicit: Vec<usize>,
    }

    impl FrameSource for NumberedFrames {
        fn load(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            let index: usize = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or("bad name")?
                .parse()?;
            let value = if self.explicit.contains(&index) { 90 } else { 10 };
            Ok(Frame::new(vec![value; 3], 1, 1, 3, index))
        }
    }

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("{i}.png"))).collect()
    }

    #[test]
    fn test_image_threshold_is_exclusive() {
        let classifier = ByteClassifier::default();
        let filter = NsfwFilter::new(&classifier);
        assert!(!filter.check_image(&Frame::new(vec![85; 3], 1, 1, 3, 0)).unwrap());
        assert!(filter.check_image(&Frame::new(vec![86; 3], 1, 1, 3, 0)).unwrap());
    }

    #[test]
    fn test_video_samples_every_hundredth_frame() {
        let classifier = ByteClassifier::default();
        let frames = NumberedFrames { explicit: vec![] };
        let flagged = NsfwFilter::new(&classifier)
            .check_video(&paths(250), &frames)
            .unwrap();
        assert!(!flagged);
        assert_eq!(*classifier.seen.lock().unwrap(), vec![0, 100, 200]);
    }

    #[test]
    fn test_video_stops_at_first_positive() {
        let classifier = ByteClassifier::default();
        let frames = NumberedFrames { explicit: vec![100] };
        let flagged = NsfwFilter::new(&classifier)
            .check_video(&paths(350), &frames)
            .unwrap();
        assert!(flagged);
        assert_eq!(*classifier.seen.lock().unwrap(), vec![0, 100]);
    }

    #[test]
    fn test_video_ignores_unsampled_frames() {
        let classifier = ByteClassifier::default();
        let frames = NumberedFrames { explicit: vec![50] };
        assert!(!NsfwFilter::new(&classifier)
            .check_video(&paths(120), &frames)
            .unwrap());
    }
}
