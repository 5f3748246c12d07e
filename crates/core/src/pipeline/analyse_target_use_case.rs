use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::clustering::domain::centroid_finder::CentroidFinder;
use crate::mapping::domain::default_face_selector::select_default_faces;
use crate::mapping::domain::frame_mapper::map_frames_to_clusters;
use crate::mapping::domain::frame_record::FrameRecord;
use crate::mapping::domain::mapping_table::MappingTable;
use crate::mapping::infrastructure::face_dump::dump_faces;
use crate::mapping::infrastructure::manifest::MappingManifest;
use crate::pipeline::frame_processor::FrameOutcome;
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::progress::ProgressHandle;
use crate::pipeline::run_summary::RunSummary;
use crate::pipeline::swap_request::SwapRequest;
use crate::pipeline::swap_session::SwapSession;
use crate::shared::embedding::Embedding;
use crate::video::infrastructure::temp_workspace::TempWorkspace;

/// Finds the distinct identities in a target and builds the mapping table
/// used by mapped swapping.
pub struct AnalyseTargetUseCase<'a> {
    session: &'a SwapSession,
}

impl<'a> AnalyseTargetUseCase<'a> {
    pub fn new(session: &'a SwapSession) -> Self {
        Self { session }
    }

    /// One identity per face in a still image.
    pub fn analyse_image(&self, target: &Path) -> Result<MappingTable, PipelineError> {
        let image = self
            .session
            .frames()
            .load(target)
            .map_err(|e| PipelineError::stage("target image load", e))?;
        let faces = self
            .session
            .analyser()
            .many_faces(&image)
            .map_err(|e| PipelineError::stage("target face analysis", e))?;
        log::info!("Found {} faces in {}", faces.len(), target.display());
        Ok(MappingTable::from_target_image(target, &image, faces))
    }

    /// Analyses every frame in parallel, clusters all faces found and picks
    /// a default face per cluster.
    ///
    /// Frames that fail to load or analyse keep an empty record and are
    /// recorded in `summary`.
    pub fn analyse_frames(&self, frame_paths: &[PathBuf], summary: &mut RunSummary) -> MappingTable {
        let session = self.session;
        let indexes: HashMap<&PathBuf, usize> =
            frame_paths.iter().enumerate().map(|(i, p)| (p, i)).collect();
        let found: Mutex<Vec<FrameRecord>> = Mutex::new(Vec::with_capacity(frame_paths.len()));

        session.reporter().stage("Analysing target faces");
        let progress = ProgressHandle::new(frame_paths.len(), session.reporter());
        let report = session
            .frame_processor()
            .run(session, frame_paths, &progress, |session, frame, _| {
                let path = &frame[0];
                let index = indexes.get(path).copied().unwrap_or_default();
                let image = session.frames().load(path)?;
                let mut faces = session.analyser().many_faces(&image)?;
                for face in &mut faces {
                    face.frame_index = index;
                }
                let outcome = if faces.is_empty() {
                    FrameOutcome::NoFace
                } else {
                    FrameOutcome::Processed
                };
                found
                    .lock()
                    .map_err(|e| format!("Lock poisoned: {e}"))?
                    .push(FrameRecord::new(index, path.clone(), faces));
                Ok(outcome)
            });
        summary.absorb_analysis(report);

        let mut records = found.into_inner().unwrap_or_else(|e| e.into_inner());
        let mut seen = vec![false; frame_paths.len()];
        for record in &records {
            seen[record.index] = true;
        }
        for (index, path) in frame_paths.iter().enumerate() {
            if !seen[index] {
                records.push(FrameRecord::empty(index, path.clone()));
            }
        }
        records.sort_by_key(|r| r.index);

        session.reporter().stage("Clustering faces");
        let embeddings: Vec<Embedding> = records
            .iter()
            .flat_map(|r| r.faces.iter().map(|f| f.embedding.clone()))
            .collect();
        let centroids = CentroidFinder::new(session.config().cluster_count).find(&embeddings);
        let mut clusters = map_frames_to_clusters(&mut records, &centroids);
        for failure in select_default_faces(&mut clusters, session.frames()) {
            summary.record_failure(failure);
        }

        log::info!(
            "Clustered {} faces from {} frames into {} identities",
            embeddings.len(),
            frame_paths.len(),
            clusters.len()
        );
        MappingTable::from_clusters(clusters)
    }

    /// Assigns sources, writes the requested dump and manifest, and checks
    /// that at least one identity can be swapped.
    pub fn prepare(
        &self,
        table: &mut MappingTable,
        request: &SwapRequest,
        workspace: &TempWorkspace,
    ) -> Result<(), PipelineError> {
        self.assign_sources(table, request)?;

        if request.dump_faces {
            workspace.create()?;
            dump_faces(table, workspace, self.session.frames(), self.session.writer())
                .map_err(|e| PipelineError::stage("face dump", e))?;
        }
        if let Some(path) = &request.export_map {
            let workspace = request.dump_faces.then_some(workspace);
            MappingManifest::new(table, workspace)
                .write(path)
                .map_err(|e| PipelineError::stage("mapping export", e))?;
        }

        if !table.has_valid_map() {
            return Err(PipelineError::NoValidMapping);
        }
        Ok(())
    }

    /// Explicit per-identity sources when given, otherwise the request's
    /// source for every identity that has a target.
    pub fn assign_sources(&self, table: &mut MappingTable, request: &SwapRequest) -> Result<(), PipelineError> {
        if !request.map_sources.is_empty() {
            for (id, path) in &request.map_sources {
                let source = self.session.source_face(path)?;
                table.assign_source(*id, source)?;
            }
            return Ok(());
        }

        let ids: Vec<usize> = table
            .clusters()
            .iter()
            .filter(|c| c.target().is_some())
            .map(|c| c.id)
            .collect();
        if ids.is_empty() {
            return Ok(());
        }
        let source = self.session.source_face(&request.source)?;
        for id in ids {
            table.assign_source(id, source.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::domain::centroid_finder::ClusterCount;
    use crate::mapping::domain::cluster::ClusterState;
    use crate::mapping::domain::mapping_table::MappingError;
    use crate::pipeline::test_support::{face, harnessed, MarkedFrames, FAILING_MARK};
    use crate::shared::config::SessionConfig;
    use crate::shared::detected_face::DetectedFace;

    const A: u8 = 1;
    const A_BETTER: u8 = 2;
    const B: u8 = 3;
    const SOURCE: u8 = 9;

    fn fixed(k: usize) -> SessionConfig {
        SessionConfig {
            execution_threads: 2,
            map_faces: true,
            cluster_count: ClusterCount::Fixed(k),
            ..SessionConfig::default()
        }
    }

    fn paths(n: usize) -> Vec<PathBuf> {
        (1..=n).map(|i| PathBuf::from(format!("/t/{i:04}.png"))).collect()
    }

    /// Identities A, A, B in three frames, one face each; the second A has
    /// the higher score.
    fn three_frames() -> (MarkedFrames, Vec<(u8, Vec<DetectedFace>)>) {
        let frames = MarkedFrames::default()
            .mark("0001.png", A)
            .mark("0002.png", A_BETTER)
            .mark("0003.png", B)
            .mark("src.jpg", SOURCE);
        let faces = vec![
            (A, vec![face(0.0, &[1.0, 0.05], 0.70)]),
            (A_BETTER, vec![face(1.0, &[1.0, -0.05], 0.95)]),
            (B, vec![face(2.0, &[0.0, 1.0], 0.80)]),
            (SOURCE, vec![face(0.0, &[0.6, 0.8], 0.99)]),
        ];
        (frames, faces)
    }

    #[test]
    fn test_end_to_end_two_identities_with_best_defaults() {
        let (frames, faces) = three_frames();
        let (session, _) = harnessed(fixed(2), frames, faces);
        let mut summary = RunSummary::default();

        let table = AnalyseTargetUseCase::new(&session).analyse_frames(&paths(3), &mut summary);

        assert_eq!(table.len(), 2);
        assert_eq!(summary.analysed, 3);
        assert_eq!(summary.processed, 0);
        assert!(summary.failures.is_empty());

        let a = table
            .clusters()
            .iter()
            .find(|c| c.face_count() == 2)
            .unwrap();
        let b = table
            .clusters()
            .iter()
            .find(|c| c.face_count() == 1)
            .unwrap();
        assert_eq!(a.target().unwrap().face.score, 0.95);
        assert_eq!(a.target().unwrap().face.frame_index, 1);
        assert_eq!(b.target().unwrap().face.score, 0.80);
        assert_eq!(b.target().unwrap().face.frame_index, 2);
        assert_eq!(
            a.frames.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 1]
        );

        // every face carries exactly one cluster id
        for cluster in table.clusters() {
            for face in cluster.faces() {
                assert_eq!(face.cluster_id, Some(cluster.id));
            }
        }
    }

    #[test]
    fn test_failed_frames_recorded_and_skipped() {
        let (frames, faces) = three_frames();
        let frames = frames.mark("0004.png", FAILING_MARK).broken("0005.png");
        let (session, _) = harnessed(fixed(2), frames, faces);
        let mut summary = RunSummary::default();

        let table = AnalyseTargetUseCase::new(&session).analyse_frames(&paths(5), &mut summary);

        assert_eq!(table.len(), 2);
        assert_eq!(summary.analysed, 3);
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].path, PathBuf::from("/t/0004.png"));
        assert!(summary.failures[1].message.contains("cannot decode"));
    }

    #[test]
    fn test_no_faces_yields_empty_table() {
        let (session, _) = harnessed(fixed(2), MarkedFrames::default(), vec![]);
        let mut summary = RunSummary::default();
        let table = AnalyseTargetUseCase::new(&session).analyse_frames(&paths(4), &mut summary);
        assert!(table.is_empty());
        assert_eq!(summary.analysed, 4);
        assert_eq!(summary.no_face, 0);
    }

    #[test]
    fn test_analyse_image_one_identity_per_face() {
        let frames = MarkedFrames::default().mark("group.jpg", A);
        let faces = vec![(A, vec![face(0.0, &[1.0, 0.0], 0.9), face(4.0, &[1.0, 0.0], 0.8)])];
        let (session, _) = harnessed(fixed(1), frames, faces);

        let table = AnalyseTargetUseCase::new(&session)
            .analyse_image(Path::new("group.jpg"))
            .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table
            .clusters()
            .iter()
            .all(|c| matches!(c.state, ClusterState::HasTarget { .. })));
    }

    #[test]
    fn test_request_source_assigned_to_every_identity() {
        let (frames, faces) = three_frames();
        let (session, _) = harnessed(fixed(2), frames, faces);
        let use_case = AnalyseTargetUseCase::new(&session);
        let mut table = use_case.analyse_frames(&paths(3), &mut RunSummary::default());

        let request = SwapRequest::new("src.jpg", "/t/clip.mp4", "/t/out.mp4");
        use_case.assign_sources(&mut table, &request).unwrap();
        assert!(table
            .clusters()
            .iter()
            .all(|c| c.source().map(|s| s.face.score) == Some(0.99)));
    }

    #[test]
    fn test_explicit_sources_only_for_listed_identities() {
        let (frames, faces) = three_frames();
        let (session, _) = harnessed(fixed(2), frames, faces);
        let use_case = AnalyseTargetUseCase::new(&session);
        let mut table = use_case.analyse_frames(&paths(3), &mut RunSummary::default());

        let mut request = SwapRequest::new("unused.jpg", "/t/clip.mp4", "/t/out.mp4");
        request.map_sources = vec![(1, PathBuf::from("src.jpg"))];
        use_case.assign_sources(&mut table, &request).unwrap();
        assert!(table.get(0).unwrap().source().is_none());
        assert!(table.get(1).unwrap().source().is_some());

        request.map_sources = vec![(7, PathBuf::from("src.jpg"))];
        assert!(matches!(
            use_case.assign_sources(&mut table, &request),
            Err(PipelineError::Mapping(MappingError::UnknownCluster(7)))
        ));
    }

    #[test]
    fn test_prepare_dumps_exports_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let (frames, faces) = three_frames();
        let (session, harness) = harnessed(fixed(2), frames, faces);
        let use_case = AnalyseTargetUseCase::new(&session);
        let mut table = use_case.analyse_frames(&paths(3), &mut RunSummary::default());
        let workspace = TempWorkspace::for_target(&dir.path().join("clip.mp4"));

        let mut request = SwapRequest::new("src.jpg", "clip.mp4", "out.mp4");
        request.dump_faces = true;
        request.export_map = Some(dir.path().join("map.json"));
        use_case.prepare(&mut table, &request, &workspace).unwrap();

        assert_eq!(harness.written().len(), 3);
        let json = std::fs::read_to_string(dir.path().join("map.json")).unwrap();
        assert!(json.contains("has_source_and_target"));
    }

    #[test]
    fn test_prepare_without_sources_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _) = harnessed(fixed(2), MarkedFrames::default(), vec![]);
        let use_case = AnalyseTargetUseCase::new(&session);
        let mut table = MappingTable::default();
        let workspace = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        let request = SwapRequest::new("src.jpg", "clip.mp4", "out.mp4");
        assert!(matches!(
            use_case.prepare(&mut table, &request, &workspace),
            Err(PipelineError::NoValidMapping)
        ));
    }
}
