use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model {name} not found; searched: {searched}")]
    NotFound { name: String, searched: String },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Resolve a model file by name from local directories only.
///
/// Resolution order:
/// 1. Explicit models directory (e.g. `--models-dir`)
/// 2. User cache directory (platform-specific)
/// 3. Bundled path (for development / pre-packaged installs)
///
/// Models are never downloaded; a missing file is a hard error.
pub fn resolve(
    name: &str,
    models_dir: Option<&Path>,
    bundled_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = models_dir {
        candidates.push(dir.to_path_buf());
    }
    match model_cache_dir() {
        Ok(dir) => candidates.push(dir),
        Err(e) => log::debug!("Skipping cache lookup: {e}"),
    }
    if let Some(dir) = bundled_dir {
        candidates.push(dir.to_path_buf());
    }

    for dir in &candidates {
        let path = dir.join(name);
        if path.is_file() {
            log::debug!("Resolved model {name} at {}", path.display());
            return Ok(path);
        }
    }

    Err(ModelResolveError::NotFound {
        name: name.to_string(),
        searched: candidates
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/faceswap/models/`
/// - Linux: `$XDG_CACHE_HOME/faceswap/models/` or `~/.cache/faceswap/models/`
/// - Windows: `%LOCALAPPDATA%/faceswap/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("faceswap").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("faceswap").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}
