use crate::pipeline::analyse_target_use_case::AnalyseTargetUseCase;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::run_summary::RunSummary;
use crate::pipeline::swap_request::SwapRequest;
use crate::pipeline::swap_session::SwapSession;
use crate::swapping::domain::frame_swapper::{SwapMode, SwapOutcome};
use crate::video::infrastructure::temp_workspace::TempWorkspace;

/// Swaps faces in a single target image.
///
/// The output is always written, even when no face was swapped.
pub struct SwapImageUseCase<'a> {
    session: &'a SwapSession,
}

impl<'a> SwapImageUseCase<'a> {
    pub fn new(session: &'a SwapSession) -> Self {
        Self { session }
    }

    pub fn execute(&self, request: &SwapRequest) -> Result<RunSummary, PipelineError> {
        let session = self.session;
        let mut frame = session
            .frames()
            .load(&request.target)
            .map_err(|e| PipelineError::stage("target image load", e))?;

        if let Some(filter) = session.nsfw_filter()? {
            let flagged = filter
                .check_image(&frame)
                .map_err(|e| PipelineError::stage("NSFW check", e))?;
            if flagged {
                return Err(PipelineError::NsfwContent(request.target.clone()));
            }
        }

        let swapper = session.frame_swapper();
        let outcome = if session.config().map_faces {
            let use_case = AnalyseTargetUseCase::new(session);
            let mut table = use_case.analyse_image(&request.target)?;
            let workspace = TempWorkspace::for_target(&request.target);
            use_case.prepare(&mut table, request, &workspace)?;
            let simple_map = table.simplify();
            swapper.swap_frame(
                SwapMode::Mapped {
                    table: &table,
                    simple_map: &simple_map,
                },
                &request.target,
                &mut frame,
            )
        } else {
            let source = session.source_face(&request.source)?;
            swapper.swap_frame(SwapMode::Single(&source.face), &request.target, &mut frame)
        }
        .map_err(|e| PipelineError::stage("face swap", e))?;

        session
            .writer()
            .write(&request.output, &frame)
            .map_err(|e| PipelineError::stage("output write", e))?;

        let mut summary = RunSummary::default();
        match outcome {
            SwapOutcome::Swapped(n) => {
                log::info!("Swapped {n} face(s) into {}", request.output.display());
                summary.processed = 1;
            }
            SwapOutcome::NoFace => {
                log::warn!("No face to swap in {}", request.target.display());
                summary.no_face = 1;
            }
        }
        summary.log();
        Ok(summary)
    }
}
