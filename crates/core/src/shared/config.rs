use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::clustering::domain::centroid_finder::ClusterCount;
use crate::pipeline::frame_processor::FailurePolicy;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("execution threads must be at least 1")]
    NoThreads,
    #[error("video quality must be between 0 and 51, got {0}")]
    Quality(u32),
    #[error("cluster count must be at least 1")]
    ZeroClusters,
    #[error("unknown video encoder '{0}'; expected libx264, libx265 or libvpx-vp9")]
    Encoder(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoEncoder {
    #[default]
    Libx264,
    Libx265,
    LibvpxVp9,
}

impl VideoEncoder {
    /// The ffmpeg encoder name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Libx264 => "libx264",
            Self::Libx265 => "libx265",
            Self::LibvpxVp9 => "libvpx-vp9",
        }
    }
}

impl fmt::Display for VideoEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoEncoder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "libx264" => Ok(Self::Libx264),
            "libx265" => Ok(Self::Libx265),
            "libvpx-vp9" => Ok(Self::LibvpxVp9),
            other => Err(ConfigError::Encoder(other.to_string())),
        }
    }
}

/// Settings for one swap session, fixed before any model is loaded.
///
/// Passed by reference into every component that needs it; nothing reads
/// configuration from global state.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Worker threads for per-frame processing.
    pub execution_threads: usize,
    /// Swap every face in a frame instead of only the leftmost one.
    pub many_faces: bool,
    /// Swap per identity using a source-target mapping.
    pub map_faces: bool,
    /// Encode at the target's frame rate instead of the default 30 fps.
    pub keep_fps: bool,
    pub keep_audio: bool,
    /// Leave extracted frames on disk after the run.
    pub keep_frames: bool,
    pub nsfw_filter: bool,
    pub video_encoder: VideoEncoder,
    /// Constant rate factor, 0 (lossless) to 51 (worst).
    pub video_quality: u32,
    pub cluster_count: ClusterCount,
    pub failure_policy: FailurePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            execution_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            many_faces: false,
            map_faces: false,
            keep_fps: true,
            keep_audio: true,
            keep_frames: false,
            nsfw_filter: false,
            video_encoder: VideoEncoder::default(),
            video_quality: 18,
            cluster_count: ClusterCount::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution_threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if self.video_quality > 51 {
            return Err(ConfigError::Quality(self.video_quality));
        }
        match self.cluster_count {
            ClusterCount::Fixed(0) | ClusterCount::Elbow { max_k: 0 } => {
                Err(ConfigError::ZeroClusters)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.execution_threads >= 1);
        assert!(config.keep_audio);
        assert!(!config.keep_frames);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = SessionConfig {
            execution_threads: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoThreads));
    }

    #[test]
    fn test_quality_out_of_range_rejected() {
        let config = SessionConfig {
            video_quality: 52,
            ..SessionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Quality(52)));
    }

    #[rstest]
    #[case(ClusterCount::Fixed(0))]
    #[case(ClusterCount::Elbow { max_k: 0 })]
    fn test_zero_clusters_rejected(#[case] count: ClusterCount) {
        let config = SessionConfig {
            cluster_count: count,
            ..SessionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroClusters));
    }

    #[rstest]
    #[case("libx264", VideoEncoder::Libx264)]
    #[case("libx265", VideoEncoder::Libx265)]
    #[case("libvpx-vp9", VideoEncoder::LibvpxVp9)]
    fn test_encoder_parse(#[case] name: &str, #[case] expected: VideoEncoder) {
        assert_eq!(name.parse::<VideoEncoder>().unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[test]
    fn test_encoder_parse_unknown() {
        assert_eq!(
            "h264_nvenc".parse::<VideoEncoder>(),
            Err(ConfigError::Encoder("h264_nvenc".to_string()))
        );
    }
}
