use serde::Serialize;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::embedding::Embedding;

/// One face found in one frame, with its identity embedding.
///
/// `cluster_id` is filled in by the frame-to-cluster mapper and stays
/// `None` for faces that never went through clustering (e.g. source faces).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectedFace {
    pub bbox: BoundingBox,
    pub score: f32,
    pub embedding: Embedding,
    pub keypoints: Option<[(f32, f32); 5]>,
    pub frame_index: usize,
    pub cluster_id: Option<usize>,
}

impl DetectedFace {
    pub fn new(bbox: BoundingBox, score: f32, embedding: Embedding, frame_index: usize) -> Self {
        Self {
            bbox,
            score,
            embedding,
            keypoints: None,
            frame_index,
            cluster_id: None,
        }
    }

    pub fn with_keypoints(mut self, keypoints: [(f32, f32); 5]) -> Self {
        self.keypoints = Some(keypoints);
        self
    }
}

/// The leftmost face (smallest `x1`), matching how a single face is picked
/// when an image may contain several.
pub fn leftmost_face(faces: Vec<DetectedFace>) -> Option<DetectedFace> {
    faces.into_iter().min_by(|a, b| {
        a.bbox
            .x1
            .partial_cmp(&b.bbox.x1)
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}
