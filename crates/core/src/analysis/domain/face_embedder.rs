use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

/// Domain interface for turning a face crop into an identity embedding.
pub trait FaceEmbedder: Send + Sync {
    fn embed(&self, face_crop: &Frame) -> Result<Embedding, Box<dyn std::error::Error>>;
}
