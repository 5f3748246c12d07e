use std::path::Path;

use crate::analysis::domain::face_analyser::FaceAnalyser;
use crate::mapping::domain::mapping_table::{MappingTable, SimpleMap};
use crate::shared::detected_face::DetectedFace;
use crate::shared::frame::Frame;
use crate::swapping::domain::face_swapper::FaceSwapper;

/// What happened to one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapOutcome {
    /// This many faces were replaced.
    Swapped(usize),
    /// Nothing to swap; the frame is left as it was.
    NoFace,
}

impl SwapOutcome {
    fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::NoFace
        } else {
            Self::Swapped(count)
        }
    }
}

/// Where the source faces for a frame come from.
#[derive(Clone, Copy, Debug)]
pub enum SwapMode<'m> {
    /// One source face for the whole target.
    Single(&'m DetectedFace),
    /// Per-identity sources from a mapping table.
    Mapped {
        table: &'m MappingTable,
        simple_map: &'m SimpleMap,
    },
}

/// Applies the face swapper to whole frames.
pub struct FrameSwapper<'a> {
    analyser: &'a dyn FaceAnalyser,
    swapper: &'a dyn FaceSwapper,
    many_faces: bool,
}

impl<'a> FrameSwapper<'a> {
    pub fn new(analyser: &'a dyn FaceAnalyser, swapper: &'a dyn FaceSwapper, many_faces: bool) -> Self {
        Self {
            analyser,
            swapper,
            many_faces,
        }
    }

    pub fn swap_frame(
        &self,
        mode: SwapMode<'_>,
        path: &Path,
        frame: &mut Frame,
    ) -> Result<SwapOutcome, Box<dyn std::error::Error>> {
        match mode {
            SwapMode::Single(source) => self.swap_with_source(source, frame),
            SwapMode::Mapped { table, simple_map } => {
                self.swap_mapped(table, simple_map, path, frame)
            }
        }
    }

    /// Puts `source` on the leftmost face of the frame, or on every face
    /// when `many_faces` is set.
    pub fn swap_with_source(
        &self,
        source: &DetectedFace,
        frame: &mut Frame,
    ) -> Result<SwapOutcome, Box<dyn std::error::Error>> {
        let targets = if self.many_faces {
            self.analyser.many_faces(frame)?
        } else {
            self.analyser.one_face(frame)?.into_iter().collect()
        };
        for target in &targets {
            self.swapper.swap(source, target, frame)?;
        }
        Ok(SwapOutcome::from_count(targets.len()))
    }

    /// Swaps each mapped identity's faces in the frame stored at `path`.
    ///
    /// Frames the mapping never saw (e.g. their analysis failed earlier)
    /// are analysed now and each face is matched to the nearest mapped
    /// target.
    pub fn swap_mapped(
        &self,
        table: &MappingTable,
        simple_map: &SimpleMap,
        path: &Path,
        frame: &mut Frame,
    ) -> Result<SwapOutcome, Box<dyn std::error::Error>> {
        if !table.covers_frame(path) {
            return self.swap_by_similarity(simple_map, frame);
        }
        let pairs = table.swap_pairs_in_frame(path, self.many_faces);
        for (source, target) in &pairs {
            self.swapper.swap(source, target, frame)?;
        }
        Ok(SwapOutcome::from_count(pairs.len()))
    }

    fn swap_by_similarity(
        &self,
        simple_map: &SimpleMap,
        frame: &mut Frame,
    ) -> Result<SwapOutcome, Box<dyn std::error::Error>> {
        if simple_map.is_empty() {
            return Ok(SwapOutcome::NoFace);
        }
        let faces = self.analyser.many_faces(frame)?;
        let mut count = 0;
        for target in &faces {
            if let Some(source) = simple_map.source_for(&target.embedding) {
                self.swapper.swap(source, target, frame)?;
                count += 1;
            }
        }
        Ok(SwapOutcome::from_count(count))
    }
}
