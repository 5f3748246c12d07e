//! Media kind detection by file extension and output path naming.

use std::path::{Path, PathBuf};

use crate::shared::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

pub fn media_kind(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

pub fn is_image(path: &Path) -> bool {
    media_kind(path) == Some(MediaKind::Image)
}

/// When `output` is an existing directory, names the result
/// `<source stem>-<target stem>.<target ext>` inside it.
pub fn normalize_output_path(source: &Path, target: &Path, output: &Path) -> PathBuf {
    if !output.is_dir() {
        return output.to_path_buf();
    }
    let source_stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let target_stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{source_stem}-{target_stem}");
    if let Some(ext) = target.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    output.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("face.png", Some(MediaKind::Image))]
    #[case("face.JPG", Some(MediaKind::Image))]
    #[case("clip.mp4", Some(MediaKind::Video))]
    #[case("clip.MKV", Some(MediaKind::Video))]
    #[case("notes.txt", None)]
    #[case("no_extension", None)]
    fn test_media_kind(#[case] name: &str, #[case] expected: Option<MediaKind>) {
        assert_eq!(media_kind(Path::new(name)), expected);
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("a/b.jpeg")));
        assert!(!is_image(Path::new("a/b.mov")));
    }

    #[test]
    fn test_normalize_output_path_file_is_unchanged() {
        let out = normalize_output_path(
            Path::new("src.jpg"),
            Path::new("target.mp4"),
            Path::new("/definitely/not/a/dir/out.mp4"),
        );
        assert_eq!(out, PathBuf::from("/definitely/not/a/dir/out.mp4"));
    }

    #[test]
    fn test_normalize_output_path_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = normalize_output_path(
            Path::new("/in/alice.jpg"),
            Path::new("/in/party.mp4"),
            dir.path(),
        );
        assert_eq!(out, dir.path().join("alice-party.mp4"));
    }
}
