use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::mapping::domain::mapping_table::MappingError;
use crate::shared::config::ConfigError;
use crate::shared::model_resolver::ModelResolveError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no face found in source image {0}")]
    NoSourceFace(PathBuf),
    #[error("no source face is mapped to a target face")]
    NoValidMapping,
    #[error("NSFW content detected in {0}")]
    NsfwContent(PathBuf),
    #[error("unsupported target {0}; expected an image or a video")]
    UnsupportedTarget(PathBuf),
    #[error("run cancelled")]
    Cancelled,
    #[error("run aborted after {failed} failed frame(s)")]
    Aborted { failed: usize },
    #[error("{stage} failed: {message}")]
    Stage { stage: &'static str, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelResolveError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl PipelineError {
    /// Wraps an error from a trait seam with the stage it came from.
    pub fn stage(stage: &'static str, error: impl fmt::Display) -> Self {
        Self::Stage {
            stage,
            message: error.to_string(),
        }
    }
}
