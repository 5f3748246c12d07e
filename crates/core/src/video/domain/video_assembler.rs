use std::path::{Path, PathBuf};

use crate::shared::config::VideoEncoder;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeSettings {
    pub fps: f64,
    pub encoder: VideoEncoder,
    /// Constant rate factor passed to the encoder.
    pub quality: u32,
}

/// Turns processed frames back into a video.
pub trait VideoAssembler: Send {
    /// Encodes `frame_paths` in the given order into `output`.
    fn assemble(
        &self,
        frame_paths: &[PathBuf],
        output: &Path,
        settings: &EncodeSettings,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Writes `output` with the video of `video` and the audio of `source`.
    /// Fails when `source` has no audio stream.
    fn restore_audio(
        &self,
        source: &Path,
        video: &Path,
        output: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
