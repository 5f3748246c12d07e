//! JSON export of a mapping table for review tooling.
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::mapping::domain::cluster::{Cluster, FaceCrop};
use crate::mapping::domain::frame_record::FrameRecord;
use crate::mapping::domain::mapping_table::MappingTable;
use crate::shared::detected_face::DetectedFace;
use crate::video::infrastructure::temp_workspace::TempWorkspace;

#[derive(Debug, Serialize)]
pub struct MappingManifest<'a> {
    pub clusters: Vec<ClusterEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ClusterEntry<'a> {
    pub id: usize,
    pub state: &'static str,
    pub face_count: usize,
    pub target: Option<FaceEntry<'a>>,
    pub source: Option<FaceEntry<'a>>,
    pub frames: &'a [FrameRecord],
}

#[derive(Debug, Serialize)]
pub struct FaceEntry<'a> {
    pub face: &'a DetectedFace,
    pub crop_width: u32,
    pub crop_height: u32,
    /// Where the crop was dumped, when a face dump ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_path: Option<PathBuf>,
}

impl<'a> FaceEntry<'a> {
    fn from_crop(crop: &'a FaceCrop, crop_path: Option<PathBuf>) -> Self {
        Self {
            face: &crop.face,
            crop_width: crop.crop.width(),
            crop_height: crop.crop.height(),
            crop_path,
        }
    }
}

impl<'a> MappingManifest<'a> {
    /// With a workspace, target entries point at the dumped crop of the
    /// representative face when that file exists.
    pub fn new(table: &'a MappingTable, workspace: Option<&TempWorkspace>) -> Self {
        let clusters = table
            .clusters()
            .iter()
            .map(|cluster| ClusterEntry {
                id: cluster.id,
                state: cluster.state.label(),
                face_count: cluster.face_count(),
                target: cluster
                    .target()
                    .map(|t| FaceEntry::from_crop(t, dumped_crop(cluster, t, workspace))),
                source: cluster.source().map(|s| FaceEntry::from_crop(s, None)),
                frames: &cluster.frames,
            })
            .collect();
        Self { clusters }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn write(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Wrote mapping manifest to {}", path.display());
        Ok(())
    }
}

fn dumped_crop(cluster: &Cluster, target: &FaceCrop, workspace: Option<&TempWorkspace>) -> Option<PathBuf> {
    let workspace = workspace?;
    let record = cluster
        .frames
        .iter()
        .find(|r| r.index == target.face.frame_index)?;
    let n = record.faces.iter().position(|f| f == &target.face)?;
    let path = workspace
        .cluster_dir(cluster.id)
        .join(format!("{}_{n}.png", record.index));
    path.exists().then_some(path)
}
