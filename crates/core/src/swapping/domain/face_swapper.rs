use crate::shared::detected_face::DetectedFace;
use crate::shared::frame::Frame;

/// Replaces the identity of one face in a frame, in place.
pub trait FaceSwapper: Send + Sync {
    fn swap(
        &self,
        source: &DetectedFace,
        target: &DetectedFace,
        frame: &mut Frame,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
