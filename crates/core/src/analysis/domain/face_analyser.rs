use crate::analysis::domain::face_detector::FaceDetector;
use crate::analysis::domain::face_embedder::FaceEmbedder;
use crate::shared::detected_face::{leftmost_face, DetectedFace};
use crate::shared::frame::Frame;

/// Finds every face in a frame together with its embedding.
///
/// An empty result means "no face", which is not an error.
pub trait FaceAnalyser: Send + Sync {
    fn analyse(&self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;

    /// The leftmost face, used when a single face stands for the image.
    fn one_face(&self, frame: &Frame) -> Result<Option<DetectedFace>, Box<dyn std::error::Error>> {
        Ok(leftmost_face(self.analyse(frame)?))
    }

    fn many_faces(&self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        self.analyse(frame)
    }
}

/// Detection followed by per-face embedding of the cropped box.
pub struct DetectAndEmbedAnalyser {
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
}

impl DetectAndEmbedAnalyser {
    pub fn new(detector: Box<dyn FaceDetector>, embedder: Box<dyn FaceEmbedder>) -> Self {
        Self { detector, embedder }
    }
}

impl FaceAnalyser for DetectAndEmbedAnalyser {
    fn analyse(&self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let candidates = self.detector.detect(frame)?;
        let mut faces = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let rect = candidate.bbox.to_pixel_rect(frame.width(), frame.height());
            if rect.is_empty() {
                log::debug!(
                    "Frame {}: dropping face outside the frame at {:?}",
                    frame.index(),
                    candidate.bbox
                );
                continue;
            }
            let embedding = self.embedder.embed(&frame.crop(&rect))?;
            let mut face =
                DetectedFace::new(candidate.bbox, candidate.score, embedding, frame.index());
            face.keypoints = candidate.keypoints;
            faces.push(face);
        }

        Ok(faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::face_detector::FaceCandidate;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::embedding::Embedding;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // --- Stubs ---

    struct StubDetector {
        candidates: Vec<FaceCandidate>,
    }

    impl FaceDetector for StubDetector {
        fn detect(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
            Ok(self.candidates.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(
            &self,
            _frame: &Frame,
        ) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
            Err("model crashed".into())
        }
    }

    /// Embeds a crop as its (width, height), which makes crops traceable.
    struct SizeEmbedder {
        calls: Arc<AtomicUsize>,
    }

    impl FaceEmbedder for SizeEmbedder {
        fn embed(&self, face_crop: &Frame) -> Result<Embedding, Box<dyn std::error::Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Embedding::new(vec![
                face_crop.width() as f32,
                face_crop.height() as f32,
            ]))
        }
    }

    fn candidate(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> FaceCandidate {
        FaceCandidate {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            score,
            keypoints: None,
        }
    }

    fn analyser(candidates: Vec<FaceCandidate>) -> (DetectAndEmbedAnalyser, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let analyser = DetectAndEmbedAnalyser::new(
            Box::new(StubDetector { candidates }),
            Box::new(SizeEmbedder {
                calls: calls.clone(),
            }),
        );
        (analyser, calls)
    }

    fn frame() -> Frame {
        Frame::new(vec![0u8; 100 * 80 * 3], 100, 80, 3, 7)
    }

    #[test]
    fn test_no_candidates_is_empty_not_error() {
        let (analyser, calls) = analyser(vec![]);
        assert!(analyser.analyse(&frame()).unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_faces_carry_frame_index_and_score() {
        let (analyser, _) = analyser(vec![candidate(10.0, 10.0, 40.0, 30.0, 0.8)]);
        let faces = analyser.analyse(&frame()).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].frame_index, 7);
        assert_eq!(faces[0].score, 0.8);
        assert_eq!(faces[0].cluster_id, None);
        // 30x20 crop, normalised
        let expected = Embedding::new(vec![30.0, 20.0]);
        assert_eq!(faces[0].embedding, expected);
    }

    #[test]
    fn test_face_outside_frame_is_dropped() {
        let (analyser, calls) = analyser(vec![
            candidate(200.0, 200.0, 250.0, 250.0, 0.9),
            candidate(0.0, 0.0, 10.0, 10.0, 0.7),
        ]);
        let faces = analyser.analyse(&frame()).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_one_face_picks_leftmost() {
        let (analyser, _) = analyser(vec![
            candidate(50.0, 0.0, 70.0, 20.0, 0.99),
            candidate(5.0, 0.0, 25.0, 20.0, 0.5),
        ]);
        let face = analyser.one_face(&frame()).unwrap().unwrap();
        assert_eq!(face.bbox.x1, 5.0);
    }

    #[test]
    fn test_one_face_none_when_empty() {
        let (analyser, _) = analyser(vec![]);
        assert!(analyser.one_face(&frame()).unwrap().is_none());
    }

    #[test]
    fn test_detector_error_propagates() {
        let analyser = DetectAndEmbedAnalyser::new(
            Box::new(FailingDetector),
            Box::new(SizeEmbedder {
                calls: Arc::new(AtomicUsize::new(0)),
            }),
        );
        let err = analyser.analyse(&frame()).unwrap_err();
        assert!(err.to_string().contains("model crashed"));
    }
}
