use std::path::PathBuf;

use crate::pipeline::analyse_target_use_case::AnalyseTargetUseCase;
use crate::pipeline::frame_processor::{FailurePolicy, FrameOutcome};
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::progress::ProgressHandle;
use crate::pipeline::run_summary::RunSummary;
use crate::pipeline::swap_request::SwapRequest;
use crate::pipeline::swap_session::SwapSession;
use crate::shared::constants::DEFAULT_FPS;
use crate::swapping::domain::frame_swapper::{SwapMode, SwapOutcome};
use crate::video::domain::frame_extractor::FrameExtractor;
use crate::video::domain::video_assembler::{EncodeSettings, VideoAssembler};
use crate::video::infrastructure::temp_workspace::TempWorkspace;

/// Orchestrates a video swap:
/// `extract → [NSFW check] → [analyse + map] → swap frames → encode → audio`
///
/// Frames are swapped in place inside the temp workspace, which is removed
/// afterwards unless the session keeps frames.
pub struct SwapVideoUseCase<'a> {
    session: &'a SwapSession,
    extractor: Box<dyn FrameExtractor>,
    assembler: Box<dyn VideoAssembler>,
}

impl<'a> SwapVideoUseCase<'a> {
    pub fn new(
        session: &'a SwapSession,
        extractor: Box<dyn FrameExtractor>,
        assembler: Box<dyn VideoAssembler>,
    ) -> Self {
        Self {
            session,
            extractor,
            assembler,
        }
    }

    pub fn execute(&self, request: &SwapRequest) -> Result<RunSummary, PipelineError> {
        let workspace = TempWorkspace::for_target(&request.target);
        workspace.clean(false)?;
        workspace.create()?;

        let result = self.run_in(&workspace, request);

        let keep = request.keeps_workspace(self.session.config().keep_frames);
        if let Err(e) = workspace.clean(keep) {
            log::warn!("Failed to clean {}: {e}", workspace.root().display());
        }
        result
    }

    fn run_in(&self, workspace: &TempWorkspace, request: &SwapRequest) -> Result<RunSummary, PipelineError> {
        let session = self.session;
        let config = session.config();

        session.reporter().stage("Extracting frames");
        let metadata = self
            .extractor
            .extract(&request.target, workspace.root())
            .map_err(|e| PipelineError::stage("frame extraction", e))?;
        let frame_paths = workspace.frame_paths()?;
        if frame_paths.is_empty() {
            return Err(PipelineError::stage("frame extraction", "no frames extracted"));
        }

        if let Some(filter) = session.nsfw_filter()? {
            let flagged = filter
                .check_video(&frame_paths, session.frames())
                .map_err(|e| PipelineError::stage("NSFW check", e))?;
            if flagged {
                return Err(PipelineError::NsfwContent(request.target.clone()));
            }
        }

        let mut summary = RunSummary::default();
        let mapping = if config.map_faces {
            let use_case = AnalyseTargetUseCase::new(session);
            let mut table = use_case.analyse_frames(&frame_paths, &mut summary);
            use_case.prepare(&mut table, request, workspace)?;
            let simple_map = table.simplify();
            Some((table, simple_map))
        } else {
            None
        };
        let source = if mapping.is_none() {
            Some(session.source_face(&request.source)?)
        } else {
            None
        };
        let mode = match (&mapping, &source) {
            (Some((table, simple_map)), _) => SwapMode::Mapped { table, simple_map },
            (None, Some(source)) => SwapMode::Single(&source.face),
            (None, None) => return Err(PipelineError::NoValidMapping),
        };

        self.swap_frames(&frame_paths, mode, &mut summary)?;

        session.reporter().stage("Assembling video");
        let fps = if config.keep_fps {
            metadata.fps_or(DEFAULT_FPS)
        } else {
            DEFAULT_FPS
        };
        let settings = EncodeSettings {
            fps,
            encoder: config.video_encoder,
            quality: config.video_quality,
        };
        let temp_video = workspace.temp_output_path();
        self.assembler
            .assemble(&frame_paths, &temp_video, &settings)
            .map_err(|e| PipelineError::stage("video encoding", e))?;

        if config.keep_audio {
            session.reporter().stage("Restoring audio");
            if let Err(e) = self
                .assembler
                .restore_audio(&request.target, &temp_video, &request.output)
            {
                log::warn!("Restoring audio failed, keeping video without audio: {e}");
                workspace.move_temp(&request.output)?;
            }
        } else {
            workspace.move_temp(&request.output)?;
        }

        log::info!("Wrote {}", request.output.display());
        summary.log();
        Ok(summary)
    }

    fn swap_frames(
        &self,
        frame_paths: &[PathBuf],
        mode: SwapMode<'_>,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let session = self.session;
        session.reporter().stage("Swapping faces");
        let progress = ProgressHandle::new(frame_paths.len(), session.reporter());
        let swapper = session.frame_swapper();

        let report = session
            .frame_processor()
            .run(session, frame_paths, &progress, |session, frame, _| {
                let path = &frame[0];
                let mut image = session.frames().load(path)?;
                match swapper.swap_frame(mode, path, &mut image)? {
                    SwapOutcome::Swapped(_) => {
                        session.writer().write(path, &image)?;
                        Ok(FrameOutcome::Processed)
                    }
                    SwapOutcome::NoFace => Ok(FrameOutcome::NoFace),
                }
            });

        let failed = report.failed();
        let skipped = report.skipped;
        summary.absorb(report);
        if session.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        if session.config().failure_policy == FailurePolicy::Abort && failed > 0 {
            log::warn!("{skipped} frame(s) skipped after the first failure");
            return Err(PipelineError::Aborted { failed });
        }
        Ok(())
    }
}
