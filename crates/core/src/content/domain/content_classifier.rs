use crate::shared::frame::Frame;

/// Scores how likely a frame is to contain explicit content.
pub trait ContentClassifier: Send + Sync {
    /// Probability in `[0, 1]` that `frame` is NSFW.
    fn nsfw_probability(&self, frame: &Frame) -> Result<f32, Box<dyn std::error::Error>>;
}
