use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use faceswap_core::clustering::domain::centroid_finder::ClusterCount;
use faceswap_core::pipeline::frame_processor::FailurePolicy;
use faceswap_core::pipeline::infrastructure::swap_session_factory::open_swap_session;
use faceswap_core::pipeline::progress::LogProgressReporter;
use faceswap_core::pipeline::swap_image_use_case::SwapImageUseCase;
use faceswap_core::pipeline::swap_request::SwapRequest;
use faceswap_core::pipeline::swap_video_use_case::SwapVideoUseCase;
use faceswap_core::shared::config::{SessionConfig, VideoEncoder};
use faceswap_core::shared::constants::DEFAULT_MAX_CLUSTERS;
use faceswap_core::shared::media_path::{is_image, media_kind, normalize_output_path, MediaKind};
use faceswap_core::video::infrastructure::ffmpeg_frame_extractor::FfmpegFrameExtractor;
use faceswap_core::video::infrastructure::ffmpeg_video_assembler::FfmpegVideoAssembler;
use faceswap_core::video::infrastructure::image_file_reader::ImageFileReader;
use faceswap_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Swap faces from a source image into a target image or video.
#[derive(Parser)]
#[command(name = "faceswap")]
struct Cli {
    /// Image holding the face to put on the target.
    source: PathBuf,

    /// Target image or video.
    target: PathBuf,

    /// Output file, or an existing directory to write into.
    output: PathBuf,

    /// Swap every face instead of only the leftmost one.
    #[arg(long)]
    many_faces: bool,

    /// Cluster target faces into identities and swap each one separately.
    #[arg(long)]
    map_faces: bool,

    /// Source image for one identity, as ID=IMAGE (repeatable; implies --map-faces).
    #[arg(long, value_parser = parse_map_source)]
    map_source: Vec<(usize, PathBuf)>,

    /// Exact number of identities to look for (default: elbow heuristic).
    #[arg(long)]
    clusters: Option<usize>,

    /// Upper bound for the elbow heuristic.
    #[arg(long, default_value_t = DEFAULT_MAX_CLUSTERS)]
    max_clusters: usize,

    /// Write every clustered face crop to the temp directory (keeps it).
    #[arg(long)]
    dump_faces: bool,

    /// Write the face mapping as JSON to this file.
    #[arg(long)]
    export_map: Option<PathBuf>,

    /// Encode at 30 fps instead of the target's frame rate.
    #[arg(long)]
    no_keep_fps: bool,

    /// Drop the target's audio.
    #[arg(long)]
    no_keep_audio: bool,

    /// Keep extracted frames after the run.
    #[arg(long)]
    keep_frames: bool,

    /// Refuse NSFW targets.
    #[arg(long)]
    nsfw_filter: bool,

    /// Video encoder: libx264, libx265 or libvpx-vp9.
    #[arg(long, default_value = "libx264")]
    video_encoder: VideoEncoder,

    /// CRF quality (0=lossless, 51=worst).
    #[arg(long, default_value_t = 18)]
    video_quality: u32,

    /// Worker threads for per-frame processing (default: all cores).
    #[arg(long)]
    execution_threads: Option<usize>,

    /// On a failed frame: best-effort (continue) or abort.
    #[arg(long, default_value = "best-effort")]
    failure_policy: FailurePolicy,

    /// Directory holding the ONNX models.
    #[arg(long)]
    models_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = session_config(&cli);
    let session = open_swap_session(config, cli.models_dir.as_deref())?
        .with_progress(Box::new(LogProgressReporter::default()));

    let output = normalize_output_path(&cli.source, &cli.target, &cli.output);
    let request = SwapRequest {
        source: cli.source,
        target: cli.target,
        output,
        map_sources: cli.map_source,
        dump_faces: cli.dump_faces,
        export_map: cli.export_map,
    };

    let summary = match media_kind(&request.target) {
        Some(MediaKind::Image) => SwapImageUseCase::new(&session).execute(&request)?,
        Some(MediaKind::Video) => SwapVideoUseCase::new(
            &session,
            Box::new(FfmpegFrameExtractor::new(Box::new(ImageFileWriter::new()))),
            Box::new(FfmpegVideoAssembler::new(Box::new(ImageFileReader::new()))),
        )
        .execute(&request)?,
        None => {
            return Err(format!("Unsupported target: {}", request.target.display()).into());
        }
    };

    if !summary.failures.is_empty() {
        log::warn!(
            "{} frame(s) failed; see the run summary above",
            summary.failures.len()
        );
    }
    eprintln!("Done: {}", request.output.display());
    Ok(())
}

fn session_config(cli: &Cli) -> SessionConfig {
    let defaults = SessionConfig::default();
    SessionConfig {
        execution_threads: cli.execution_threads.unwrap_or(defaults.execution_threads),
        many_faces: cli.many_faces,
        map_faces: cli.map_faces || !cli.map_source.is_empty(),
        keep_fps: !cli.no_keep_fps,
        keep_audio: !cli.no_keep_audio,
        keep_frames: cli.keep_frames,
        nsfw_filter: cli.nsfw_filter,
        video_encoder: cli.video_encoder,
        video_quality: cli.video_quality,
        cluster_count: match cli.clusters {
            Some(k) => ClusterCount::Fixed(k),
            None => ClusterCount::Elbow {
                max_k: cli.max_clusters,
            },
        },
        failure_policy: cli.failure_policy,
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    require_file(&cli.source, "Source")?;
    require_file(&cli.target, "Target")?;
    if !is_image(&cli.source) {
        return Err(format!("Source must be an image: {}", cli.source.display()).into());
    }
    for (id, path) in &cli.map_source {
        require_file(path, &format!("Source for identity {id}"))?;
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !path.is_file() {
        return Err(format!("{what} file not found: {}", path.display()).into());
    }
    Ok(())
}

fn parse_map_source(s: &str) -> Result<(usize, PathBuf), String> {
    let (id, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=IMAGE, got '{s}'"))?;
    let id = id
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid identity id '{id}': {e}"))?;
    if path.is_empty() {
        return Err(format!("missing image path in '{s}'"));
    }
    Ok((id, PathBuf::from(path)))
}
