use std::path::Path;

use crate::mapping::domain::frame_record::FrameRecord;
use crate::shared::detected_face::DetectedFace;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;

/// A face together with the pixels cut out of its frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceCrop {
    pub face: DetectedFace,
    pub crop: Frame,
}

/// What is known about one identity. A source face can only be attached
/// once a target has been chosen.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ClusterState {
    #[default]
    Unpopulated,
    HasTarget {
        target: FaceCrop,
    },
    HasSourceAndTarget {
        source: FaceCrop,
        target: FaceCrop,
    },
}

impl ClusterState {
    pub fn target(&self) -> Option<&FaceCrop> {
        match self {
            Self::Unpopulated => None,
            Self::HasTarget { target } | Self::HasSourceAndTarget { target, .. } => Some(target),
        }
    }

    pub fn source(&self) -> Option<&FaceCrop> {
        match self {
            Self::HasSourceAndTarget { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Replaces the target, keeping any source already assigned.
    pub fn with_target(self, target: FaceCrop) -> Self {
        match self {
            Self::HasSourceAndTarget { source, .. } => Self::HasSourceAndTarget { source, target },
            _ => Self::HasTarget { target },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unpopulated => "unpopulated",
            Self::HasTarget { .. } => "has_target",
            Self::HasSourceAndTarget { .. } => "has_source_and_target",
        }
    }
}

/// One identity found in the target: its centroid and, in frame order,
/// every frame holding at least one of its faces.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub id: usize,
    /// `None` for clusters that were not produced by centroid clustering.
    pub centroid: Option<Embedding>,
    pub frames: Vec<FrameRecord>,
    pub state: ClusterState,
}

impl Cluster {
    pub fn new(id: usize, centroid: Option<Embedding>) -> Self {
        Self {
            id,
            centroid,
            frames: Vec::new(),
            state: ClusterState::Unpopulated,
        }
    }

    pub fn target(&self) -> Option<&FaceCrop> {
        self.state.target()
    }

    pub fn source(&self) -> Option<&FaceCrop> {
        self.state.source()
    }

    pub fn faces(&self) -> impl Iterator<Item = &DetectedFace> {
        self.frames.iter().flat_map(|f| f.faces.iter())
    }

    pub fn face_count(&self) -> usize {
        self.frames.iter().map(|f| f.faces.len()).sum()
    }

    /// This cluster's faces in the frame stored at `path`.
    pub fn faces_in_frame(&self, path: &Path) -> &[DetectedFace] {
        self.frames
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.faces.as_slice())
            .unwrap_or(&[])
    }
}
