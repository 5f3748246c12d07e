use std::path::PathBuf;

/// What to swap, and where to put the result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwapRequest {
    pub source: PathBuf,
    pub target: PathBuf,
    pub output: PathBuf,
    /// Mapped mode: per-identity source images. When empty, `source` is
    /// used for every identity.
    pub map_sources: Vec<(usize, PathBuf)>,
    /// Write every clustered face crop into the temp workspace.
    pub dump_faces: bool,
    /// Write the mapping as JSON to this path.
    pub export_map: Option<PathBuf>,
}

impl SwapRequest {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    /// Face dumps live in the temp workspace, so asking for them keeps it.
    pub fn keeps_workspace(&self, keep_frames: bool) -> bool {
        keep_frames || self.dump_faces
    }
}
