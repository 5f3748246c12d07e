pub mod bounding_box;
pub mod config;
pub mod constants;
pub mod detected_face;
pub mod embedding;
pub mod frame;
pub mod frame_failure;
pub mod media_path;
pub mod model_resolver;
pub mod onnx_session;
pub mod video_metadata;
