//! Stubs shared by the use case tests.
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::analysis::domain::face_analyser::FaceAnalyser;
use crate::content::domain::content_classifier::ContentClassifier;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::swap_session::SwapSession;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::config::SessionConfig;
use crate::shared::detected_face::DetectedFace;
use crate::shared::embedding::Embedding;
use crate::shared::frame::Frame;
use crate::swapping::domain::face_swapper::FaceSwapper;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::image_writer::ImageWriter;

pub const FRAME_SIZE: u32 = 8;
/// Frames carrying this mark make the analyser fail.
pub const FAILING_MARK: u8 = 255;

pub fn face(x1: f32, v: &[f32], score: f32) -> DetectedFace {
    DetectedFace::new(
        BoundingBox::new(x1, 0.0, x1 + 4.0, 4.0),
        score,
        Embedding::new(v.to_vec()),
        0,
    )
}

/// Frames filled with a per-file-name byte; unknown names get 0.
#[derive(Clone, Default)]
pub struct MarkedFrames {
    marks: HashMap<String, u8>,
    broken: HashSet<String>,
}

impl MarkedFrames {
    pub fn mark(mut self, name: &str, mark: u8) -> Self {
        self.marks.insert(name.to_string(), mark);
        self
    }

    pub fn broken(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }
}

impl FrameSource for MarkedFrames {
    fn load(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.broken.contains(&name) {
            return Err(format!("cannot decode {name}").into());
        }
        let mark = self.marks.get(&name).copied().unwrap_or(0);
        let len = (FRAME_SIZE * FRAME_SIZE * 3) as usize;
        Ok(Frame::new(vec![mark; len], FRAME_SIZE, FRAME_SIZE, 3, 0))
    }
}

/// Returns the faces registered for the frame's mark.
pub struct MarkAnalyser {
    faces: HashMap<u8, Vec<DetectedFace>>,
}

impl FaceAnalyser for MarkAnalyser {
    fn analyse(&self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let mark = frame.data()[0];
        if mark == FAILING_MARK {
            return Err("analyser failure".into());
        }
        Ok(self.faces.get(&mark).cloned().unwrap_or_default())
    }
}

/// Records `(source score, target score)` per swap.
pub struct RecordingSwapper {
    swaps: Arc<Mutex<Vec<(f32, f32)>>>,
}

impl FaceSwapper for RecordingSwapper {
    fn swap(
        &self,
        source: &DetectedFace,
        target: &DetectedFace,
        _frame: &mut Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.swaps.lock().unwrap().push((source.score, target.score));
        Ok(())
    }
}

pub struct RecordingWriter {
    written: Arc<Mutex<Vec<PathBuf>>>,
}

impl ImageWriter for RecordingWriter {
    fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.written.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

pub struct FixedClassifier(pub f32);

impl ContentClassifier for FixedClassifier {
    fn nsfw_probability(&self, _frame: &Frame) -> Result<f32, Box<dyn std::error::Error>> {
        Ok(self.0)
    }
}

/// Observers for what a session did.
#[derive(Clone, Default)]
pub struct Harness {
    pub swaps: Arc<Mutex<Vec<(f32, f32)>>>,
    pub written: Arc<Mutex<Vec<PathBuf>>>,
}

impl Harness {
    pub fn swaps(&self) -> Vec<(f32, f32)> {
        let mut swaps = self.swaps.lock().unwrap().clone();
        swaps.sort_by(|a, b| a.partial_cmp(b).unwrap());
        swaps
    }

    pub fn written(&self) -> Vec<PathBuf> {
        let mut written = self.written.lock().unwrap().clone();
        written.sort();
        written
    }
}

pub fn session(
    config: SessionConfig,
    frames: MarkedFrames,
    faces: Vec<(u8, Vec<DetectedFace>)>,
) -> Result<SwapSession, PipelineError> {
    session_with_harness(config, frames, faces, &Harness::default())
}

pub fn harnessed(
    config: SessionConfig,
    frames: MarkedFrames,
    faces: Vec<(u8, Vec<DetectedFace>)>,
) -> (SwapSession, Harness) {
    let harness = Harness::default();
    let session = session_with_harness(config, frames, faces, &harness).unwrap();
    (session, harness)
}

fn session_with_harness(
    config: SessionConfig,
    frames: MarkedFrames,
    faces: Vec<(u8, Vec<DetectedFace>)>,
    harness: &Harness,
) -> Result<SwapSession, PipelineError> {
    SwapSession::new(
        config,
        Box::new(MarkAnalyser {
            faces: faces.into_iter().collect(),
        }),
        Box::new(RecordingSwapper {
            swaps: harness.swaps.clone(),
        }),
        Box::new(frames),
        Box::new(RecordingWriter {
            written: harness.written.clone(),
        }),
    )
}
