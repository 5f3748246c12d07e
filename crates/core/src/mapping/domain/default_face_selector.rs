use crate::mapping::domain::cluster::{Cluster, FaceCrop};
use crate::mapping::domain::frame_record::FrameRecord;
use crate::shared::detected_face::DetectedFace;
use crate::shared::frame_failure::FrameFailure;
use crate::video::domain::frame_source::FrameSource;

/// The highest-scoring face across `frames`, with the record it came from.
///
/// The first face of the first non-empty frame is the initial candidate;
/// only a strictly higher score replaces it, so ties keep the earliest face.
/// A NaN score ranks below every real score.
pub fn best_face(frames: &[FrameRecord]) -> Option<(&FrameRecord, &DetectedFace)> {
    let mut best: Option<(&FrameRecord, &DetectedFace)> = None;
    for record in frames {
        for face in &record.faces {
            match best {
                Some((_, current)) if !outranks(face.score, current.score) => {}
                _ => best = Some((record, face)),
            }
        }
    }
    best
}

fn outranks(score: f32, current: f32) -> bool {
    !score.is_nan() && (current.is_nan() || score > current)
}

/// Picks each cluster's representative face and crops it from its frame.
///
/// Clusters without frames are left untouched. A frame that cannot be
/// loaded leaves its cluster unchanged and is reported back. Any source
/// already assigned to a cluster is kept. Running this again on the same
/// clusters selects the same faces.
pub fn select_default_faces(clusters: &mut [Cluster], frames: &dyn FrameSource) -> Vec<FrameFailure> {
    let mut failures = Vec::new();

    for cluster in clusters.iter_mut() {
        let Some((record, face)) = best_face(&cluster.frames) else {
            log::debug!("Cluster {} has no faces; no default selected", cluster.id);
            continue;
        };
        let image = match frames.load(&record.path) {
            Ok(image) => image,
            Err(e) => {
                log::warn!(
                    "Cluster {}: cannot load {}: {e}",
                    cluster.id,
                    record.path.display()
                );
                failures.push(FrameFailure::new(&record.path, e.to_string()));
                continue;
            }
        };

        let rect = face.bbox.to_pixel_rect(image.width(), image.height());
        let target = FaceCrop {
            face: face.clone(),
            crop: image.crop(&rect),
        };
        log::debug!(
            "Cluster {}: default face from frame {} (score {:.3})",
            cluster.id,
            record.index,
            face.score
        );
        cluster.state = std::mem::take(&mut cluster.state).with_target(target);
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::domain::cluster::ClusterState;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::embedding::Embedding;
    use crate::shared::frame::Frame;
    use std::path::Path;

    /// Frames whose pixels encode the frame number, so crops are traceable.
    struct NumberedFrames;

    impl FrameSource for NumberedFrames {
        fn load(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
            let stem = path.file_stem().ok_or("no stem")?.to_string_lossy();
            if stem == "missing" {
                return Err("file not found".into());
            }
            let n: u8 = stem.parse()?;
            Ok(Frame::new(vec![n; 20 * 20 * 3], 20, 20, 3, n as usize))
        }
    }

    fn face(score: f32, x1: f32) -> DetectedFace {
        DetectedFace::new(
            BoundingBox::new(x1, 0.0, x1 + 4.0, 4.0),
            score,
            Embedding::new(vec![1.0, 0.0]),
            0,
        )
    }

    fn cluster(frames: Vec<FrameRecord>) -> Cluster {
        let mut c = Cluster::new(0, None);
        c.frames = frames;
        c
    }

    #[test]
    fn test_best_face_strictly_higher_wins() {
        let frames = vec![
            FrameRecord::empty(0, "/t/1.png"),
            FrameRecord::new(1, "/t/2.png", vec![face(0.7, 0.0), face(0.9, 5.0)]),
            FrameRecord::new(2, "/t/3.png", vec![face(0.9, 10.0)]),
        ];
        let (record, best) = best_face(&frames).unwrap();
        assert_eq!(record.index, 1);
        assert_eq!(best.bbox.x1, 5.0);
    }

    #[test]
    fn test_best_face_ignores_nan_scores() {
        let frames = vec![
            FrameRecord::new(0, "/t/1.png", vec![face(0.6, 0.0)]),
            FrameRecord::new(1, "/t/2.png", vec![face(f32::NAN, 5.0)]),
            FrameRecord::new(2, "/t/3.png", vec![face(0.4, 10.0)]),
        ];
        let (record, best) = best_face(&frames).unwrap();
        assert_eq!(record.index, 0);
        assert_eq!(best.score, 0.6);

        // a NaN first candidate is replaced by any real score
        let frames = vec![
            FrameRecord::new(0, "/t/1.png", vec![face(f32::NAN, 0.0)]),
            FrameRecord::new(1, "/t/2.png", vec![face(0.3, 5.0)]),
        ];
        assert_eq!(best_face(&frames).unwrap().1.score, 0.3);
    }

    #[test]
    fn test_best_face_none_without_faces() {
        assert!(best_face(&[]).is_none());
        assert!(best_face(&[FrameRecord::empty(0, "/t/1.png")]).is_none());
    }

    #[test]
    fn test_selects_and_crops_highest_score() {
        let mut clusters = vec![cluster(vec![
            FrameRecord::new(0, "/t/1.png", vec![face(0.6, 0.0)]),
            FrameRecord::new(1, "/t/2.png", vec![face(0.95, 2.0)]),
        ])];
        let failures = select_default_faces(&mut clusters, &NumberedFrames);

        assert!(failures.is_empty());
        let target = clusters[0].target().unwrap();
        assert_eq!(target.face.score, 0.95);
        assert_eq!((target.crop.width(), target.crop.height()), (4, 4));
        assert!(target.crop.data().iter().all(|&p| p == 2));
    }

    #[test]
    fn test_crop_clamped_to_frame() {
        let mut clusters = vec![cluster(vec![FrameRecord::new(
            0,
            "/t/1.png",
            vec![face(0.8, 18.0)],
        )])];
        select_default_faces(&mut clusters, &NumberedFrames);
        assert_eq!(clusters[0].target().unwrap().crop.width(), 2);
    }

    #[test]
    fn test_cluster_without_frames_stays_unpopulated() {
        let mut clusters = vec![cluster(vec![])];
        let failures = select_default_faces(&mut clusters, &NumberedFrames);
        assert!(failures.is_empty());
        assert_eq!(clusters[0].state, ClusterState::Unpopulated);
    }

    #[test]
    fn test_unreadable_frame_is_reported() {
        let mut clusters = vec![
            cluster(vec![FrameRecord::new(0, "/t/missing.png", vec![face(0.8, 0.0)])]),
            cluster(vec![FrameRecord::new(1, "/t/3.png", vec![face(0.8, 0.0)])]),
        ];
        let failures = select_default_faces(&mut clusters, &NumberedFrames);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, Path::new("/t/missing.png"));
        assert!(clusters[0].target().is_none());
        assert!(clusters[1].target().is_some());
    }

    #[test]
    fn test_selection_is_idempotent() {
        let mut clusters = vec![
            cluster(vec![
                FrameRecord::new(0, "/t/1.png", vec![face(0.5, 0.0), face(0.8, 6.0)]),
                FrameRecord::new(1, "/t/2.png", vec![face(0.8, 1.0)]),
            ]),
            cluster(vec![FrameRecord::new(2, "/t/3.png", vec![face(0.4, 3.0)])]),
        ];
        select_default_faces(&mut clusters, &NumberedFrames);
        let first = clusters.clone();
        select_default_faces(&mut clusters, &NumberedFrames);
        assert_eq!(clusters, first);
    }

    #[test]
    fn test_reselection_keeps_source() {
        let mut clusters = vec![cluster(vec![FrameRecord::new(
            0,
            "/t/1.png",
            vec![face(0.8, 0.0)],
        )])];
        select_default_faces(&mut clusters, &NumberedFrames);
        let source = FaceCrop {
            face: face(0.99, 0.0),
            crop: Frame::new(vec![7; 12], 2, 2, 3, 0),
        };
        let target = clusters[0].target().unwrap().clone();
        clusters[0].state = ClusterState::HasSourceAndTarget {
            source: source.clone(),
            target,
        };

        select_default_faces(&mut clusters, &NumberedFrames);
        assert_eq!(clusters[0].source(), Some(&source));
    }
}
