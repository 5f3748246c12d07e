use std::path::{Path, PathBuf};

use crate::analysis::domain::face_analyser::DetectAndEmbedAnalyser;
use crate::analysis::infrastructure::arcface_embedder::ArcFaceEmbedder;
use crate::analysis::infrastructure::onnx_yolo_face_detector::{OnnxYoloFaceDetector, DEFAULT_CONFIDENCE};
use crate::content::infrastructure::onnx_nsfw_classifier::OnnxNsfwClassifier;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::swap_session::SwapSession;
use crate::shared::config::SessionConfig;
use crate::shared::constants::{
    DETECTOR_MODEL_NAME, EMBEDDING_MODEL_NAME, NSFW_MODEL_NAME, SWAPPER_EMAP_NAME,
    SWAPPER_MODEL_NAME,
};
use crate::shared::model_resolver;
use crate::swapping::infrastructure::inswapper::{load_emap, Inswapper};
use crate::video::infrastructure::image_file_reader::ImageFileReader;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;

/// Loads every ONNX model the session needs, once, from local directories.
///
/// The NSFW classifier is only loaded when the filter is enabled.
pub fn open_swap_session(
    config: SessionConfig,
    models_dir: Option<&Path>,
) -> Result<SwapSession, PipelineError> {
    config.validate()?;
    let bundled = bundled_models_dir();
    let resolve = |name: &str| model_resolver::resolve(name, models_dir, bundled.as_deref());

    log::info!("Loading face analysis models");
    let detector = OnnxYoloFaceDetector::new(&resolve(DETECTOR_MODEL_NAME)?, DEFAULT_CONFIDENCE)
        .map_err(load_error)?;
    let embedder = ArcFaceEmbedder::new(&resolve(EMBEDDING_MODEL_NAME)?).map_err(load_error)?;

    log::info!("Loading face swap model");
    let emap = match resolve(SWAPPER_EMAP_NAME) {
        Ok(path) => Some(load_emap(&path).map_err(load_error)?),
        Err(e) => {
            log::debug!("{e}");
            None
        }
    };
    let swapper = Inswapper::new(&resolve(SWAPPER_MODEL_NAME)?, emap).map_err(load_error)?;

    let nsfw_filter = config.nsfw_filter;
    let session = SwapSession::new(
        config,
        Box::new(DetectAndEmbedAnalyser::new(Box::new(detector), Box::new(embedder))),
        Box::new(swapper),
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
    )?;

    if !nsfw_filter {
        return Ok(session);
    }
    log::info!("Loading NSFW classifier");
    let classifier = OnnxNsfwClassifier::new(&resolve(NSFW_MODEL_NAME)?).map_err(load_error)?;
    Ok(session.with_classifier(Box::new(classifier)))
}

/// `models/` next to the executable, for packaged installs.
fn bundled_models_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("models"))
}

fn load_error(e: Box<dyn std::error::Error>) -> PipelineError {
    PipelineError::stage("model load", e)
}
