use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// A face location before any identity work has been done on it.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceCandidate {
    pub bbox: BoundingBox,
    pub score: f32,
    pub keypoints: Option<[(f32, f32); 5]>,
}

/// Domain interface for locating faces in a frame.
///
/// Shared by the frame workers, so detection takes `&self`; stateful
/// backends guard their own state.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>>;
}
