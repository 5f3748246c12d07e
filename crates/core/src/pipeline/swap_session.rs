use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::analysis::domain::face_analyser::FaceAnalyser;
use crate::content::domain::content_classifier::ContentClassifier;
use crate::content::domain::nsfw_filter::NsfwFilter;
use crate::mapping::domain::cluster::FaceCrop;
use crate::pipeline::infrastructure::parallel_frame_processor::ParallelFrameProcessor;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::progress::{NullProgressReporter, ProgressReporter};
use crate::shared::config::SessionConfig;
use crate::swapping::domain::face_swapper::FaceSwapper;
use crate::swapping::domain::frame_swapper::FrameSwapper;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::image_writer::ImageWriter;

/// Everything one swap run needs: validated settings and the models and
/// frame I/O built once for the whole run.
///
/// Use cases borrow the session; nothing here is global.
pub struct SwapSession {
    config: SessionConfig,
    analyser: Box<dyn FaceAnalyser>,
    swapper: Box<dyn FaceSwapper>,
    classifier: Option<Box<dyn ContentClassifier>>,
    frames: Box<dyn FrameSource>,
    writer: Box<dyn ImageWriter>,
    reporter: Box<dyn ProgressReporter>,
    cancelled: Arc<AtomicBool>,
}

impl SwapSession {
    pub fn new(
        config: SessionConfig,
        analyser: Box<dyn FaceAnalyser>,
        swapper: Box<dyn FaceSwapper>,
        frames: Box<dyn FrameSource>,
        writer: Box<dyn ImageWriter>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            analyser,
            swapper,
            classifier: None,
            frames,
            writer,
            reporter: Box::new(NullProgressReporter),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ContentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_progress(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cancel_token(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn analyser(&self) -> &dyn FaceAnalyser {
        &*self.analyser
    }

    pub fn frames(&self) -> &dyn FrameSource {
        &*self.frames
    }

    pub fn writer(&self) -> &dyn ImageWriter {
        &*self.writer
    }

    pub fn reporter(&self) -> &dyn ProgressReporter {
        &*self.reporter
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn frame_processor(&self) -> ParallelFrameProcessor {
        ParallelFrameProcessor::new(self.config.execution_threads, self.config.failure_policy)
            .with_cancel_token(self.cancelled.clone())
    }

    pub fn frame_swapper(&self) -> FrameSwapper<'_> {
        FrameSwapper::new(&*self.analyser, &*self.swapper, self.config.many_faces)
    }

    /// The NSFW screen, when enabled.
    pub fn nsfw_filter(&self) -> Result<Option<NsfwFilter<'_>>, PipelineError> {
        if !self.config.nsfw_filter {
            return Ok(None);
        }
        let classifier = self
            .classifier
            .as_deref()
            .ok_or_else(|| PipelineError::stage("NSFW check", "no classifier loaded"))?;
        Ok(Some(NsfwFilter::new(classifier)))
    }

    /// The leftmost face of the image at `path`, cropped out of it.
    pub fn source_face(&self, path: &Path) -> Result<FaceCrop, PipelineError> {
        let image = self
            .frames
            .load(path)
            .map_err(|e| PipelineError::stage("source image load", e))?;
        let face = self
            .analyser
            .one_face(&image)
            .map_err(|e| PipelineError::stage("source face analysis", e))?
            .ok_or_else(|| PipelineError::NoSourceFace(path.to_path_buf()))?;
        let crop = image.crop(&face.bbox.to_pixel_rect(image.width(), image.height()));
        Ok(FaceCrop { face, crop })
    }
}
