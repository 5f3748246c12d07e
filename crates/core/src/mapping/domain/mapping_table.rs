use std::path::Path;

use thiserror::Error;

use crate::clustering::domain::closest_centroid::closest_centroid;
use crate::mapping::domain::cluster::{Cluster, ClusterState, FaceCrop};
use crate::mapping::domain::frame_record::FrameRecord;
use crate::shared::detected_face::DetectedFace;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

#[derive(Error, Debug, PartialEq)]
pub enum MappingError {
    #[error("no cluster with id {0}")]
    UnknownCluster(usize),
    #[error("cluster {0} has no target face yet")]
    NoTarget(usize),
}

/// Source-to-target assignments for one run, one entry per identity.
///
/// Built fresh for every run and dropped when processing is done.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappingTable {
    clusters: Vec<Cluster>,
}

/// Flattened `(source, target embedding)` pairs for live matching.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimpleMap {
    pub source_faces: Vec<DetectedFace>,
    pub target_embeddings: Vec<Embedding>,
}

impl SimpleMap {
    /// The source mapped to the target nearest to `embedding`.
    pub fn source_for(&self, embedding: &Embedding) -> Option<&DetectedFace> {
        closest_centroid(&self.target_embeddings, embedding)
            .and_then(|(i, _)| self.source_faces.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.source_faces.is_empty()
    }
}

impl MappingTable {
    pub fn from_clusters(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    /// One cluster per face of a still image, each with its own crop as
    /// target. No centroid clustering is involved.
    pub fn from_target_image(path: &Path, frame: &Frame, faces: Vec<DetectedFace>) -> Self {
        let clusters = faces
            .into_iter()
            .enumerate()
            .map(|(id, mut face)| {
                face.cluster_id = Some(id);
                let rect = face.bbox.to_pixel_rect(frame.width(), frame.height());
                let mut cluster = Cluster::new(id, None);
                cluster.state = ClusterState::HasTarget {
                    target: FaceCrop {
                        face: face.clone(),
                        crop: frame.crop(&rect),
                    },
                };
                cluster.frames.push(FrameRecord::new(frame.index(), path, vec![face]));
                cluster
            })
            .collect();
        Self { clusters }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn get(&self, id: usize) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Appends an empty entry and returns its id (highest id + 1, or 0).
    pub fn add_blank(&mut self) -> usize {
        let id = self
            .clusters
            .iter()
            .map(|c| c.id + 1)
            .max()
            .unwrap_or(0);
        self.clusters.push(Cluster::new(id, None));
        id
    }

    /// At least one identity has both a source and a target.
    pub fn has_valid_map(&self) -> bool {
        self.clusters.iter().any(|c| c.source().is_some())
    }

    /// The first assigned source face, used for faces that have no mapping
    /// of their own.
    pub fn default_source_face(&self) -> Option<&DetectedFace> {
        self.clusters
            .iter()
            .find_map(|c| c.source())
            .map(|s| &s.face)
    }

    pub fn assign_source(&mut self, id: usize, source: FaceCrop) -> Result<(), MappingError> {
        let cluster = self
            .clusters
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(MappingError::UnknownCluster(id))?;
        let target = cluster
            .target()
            .cloned()
            .ok_or(MappingError::NoTarget(id))?;
        cluster.state = ClusterState::HasSourceAndTarget { source, target };
        Ok(())
    }

    pub fn simplify(&self) -> SimpleMap {
        let mut map = SimpleMap::default();
        for cluster in &self.clusters {
            if let ClusterState::HasSourceAndTarget { source, target } = &cluster.state {
                map.source_faces.push(source.face.clone());
                map.target_embeddings.push(target.face.embedding.clone());
            }
        }
        map
    }

    /// `(source, target)` pairs for the faces in the frame at `path`.
    ///
    /// Each identity uses its own source. With `fall_back_to_default`,
    /// identities without one use [`Self::default_source_face`] instead.
    pub fn swap_pairs_in_frame(
        &self,
        path: &Path,
        fall_back_to_default: bool,
    ) -> Vec<(&DetectedFace, &DetectedFace)> {
        let fallback = if fall_back_to_default {
            self.default_source_face()
        } else {
            None
        };
        let mut pairs = Vec::new();
        for cluster in &self.clusters {
            let Some(source) = cluster.source().map(|s| &s.face).or(fallback) else {
                continue;
            };
            for target in cluster.faces_in_frame(path) {
                pairs.push((source, target));
            }
        }
        pairs
    }

    /// Whether any identity saw a face in the frame at `path`.
    pub fn covers_frame(&self, path: &Path) -> bool {
        self.clusters
            .iter()
            .any(|c| c.frames.iter().any(|f| f.path == path))
    }
}
