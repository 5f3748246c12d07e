pub const DETECTOR_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const SWAPPER_MODEL_NAME: &str = "inswapper_128_fp16.onnx";
pub const NSFW_MODEL_NAME: &str = "open_nsfw.onnx";
/// Optional projection from ArcFace embeddings into the swap model's latent space.
pub const SWAPPER_EMAP_NAME: &str = "inswapper_128_emap.bin";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm", "m4v"];

/// Extracted frames live in `<target dir>/temp/<target stem>/`.
pub const TEMP_DIRECTORY: &str = "temp";
pub const TEMP_VIDEO_FILE: &str = "temp.mp4";
pub const FRAME_EXTENSION: &str = "png";

/// Used when the target's frame rate cannot be read or `keep_fps` is off.
pub const DEFAULT_FPS: f64 = 30.0;

/// Upper bound on identities tried by the elbow heuristic.
pub const DEFAULT_MAX_CLUSTERS: usize = 10;

pub const NSFW_MAX_PROBABILITY: f32 = 0.85;
/// Every Nth extracted frame is classified when screening a video.
pub const NSFW_VIDEO_FRAME_INTERVAL: usize = 100;
