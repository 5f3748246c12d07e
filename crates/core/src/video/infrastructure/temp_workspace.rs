//! Per-target scratch directory holding extracted frames, face dumps and
//! the intermediate video.
use std::io;
use std::path::{Path, PathBuf};

use crate::shared::constants::{FRAME_EXTENSION, TEMP_DIRECTORY, TEMP_VIDEO_FILE};

/// `<target dir>/temp/<target stem>/`.
#[derive(Clone, Debug, PartialEq)]
pub struct TempWorkspace {
    root: PathBuf,
}

impl TempWorkspace {
    pub fn for_target(target: &Path) -> Self {
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "target".to_string());
        Self {
            root: parent.join(TEMP_DIRECTORY).join(stem),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Extracted frame images in timeline order: by the number in the file
    /// stem, then by name for stems that are not numbers.
    pub fn frame_paths(&self) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_frame = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(FRAME_EXTENSION));
            if is_frame {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| {
            frame_number(a)
                .cmp(&frame_number(b))
                .then_with(|| a.cmp(b))
        });
        Ok(paths)
    }

    pub fn temp_output_path(&self) -> PathBuf {
        self.root.join(TEMP_VIDEO_FILE)
    }

    /// Directory receiving the face crops of one cluster.
    pub fn cluster_dir(&self, cluster_id: usize) -> PathBuf {
        self.root.join(cluster_id.to_string())
    }

    /// Moves the intermediate video to `output`, replacing any existing file.
    pub fn move_temp(&self, output: &Path) -> io::Result<()> {
        let temp = self.temp_output_path();
        if output.exists() {
            std::fs::remove_file(output)?;
        }
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        match std::fs::rename(&temp, output) {
            Ok(()) => Ok(()),
            Err(e) => {
                // rename fails across filesystems
                log::debug!("rename failed ({e}), copying instead");
                std::fs::copy(&temp, output)?;
                std::fs::remove_file(&temp)
            }
        }
    }

    /// Removes the workspace unless `keep_frames`, then drops the shared
    /// `temp` directory if nothing else is left in it.
    pub fn clean(&self, keep_frames: bool) -> io::Result<()> {
        if !keep_frames && self.root.is_dir() {
            std::fs::remove_dir_all(&self.root)?;
        }
        if let Some(parent) = self.root.parent() {
            if parent.is_dir() && std::fs::read_dir(parent)?.next().is_none() {
                std::fs::remove_dir(parent)?;
            }
        }
        Ok(())
    }
}

fn frame_number(path: &Path) -> Option<usize> {
    path.file_stem()?.to_str()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::infrastructure::ffmpeg_frame_extractor::frame_file_name;
    use std::fs;

    #[test]
    fn test_root_layout() {
        let ws = TempWorkspace::for_target(Path::new("/videos/party.mp4"));
        assert_eq!(ws.root(), Path::new("/videos/temp/party"));
        assert_eq!(ws.temp_output_path(), PathBuf::from("/videos/temp/party/temp.mp4"));
        assert_eq!(ws.cluster_dir(3), PathBuf::from("/videos/temp/party/3"));
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let ws = TempWorkspace::for_target(Path::new("clip.mov"));
        assert_eq!(ws.root(), Path::new("./temp/clip"));
    }

    #[test]
    fn test_frame_paths_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        ws.create().unwrap();
        for name in ["0003.png", "0001.png", "0002.png", "temp.mp4", "notes.txt"] {
            fs::write(ws.root().join(name), b"x").unwrap();
        }
        fs::create_dir(ws.cluster_dir(0)).unwrap();
        fs::write(ws.cluster_dir(0).join("0001_0.png"), b"x").unwrap();

        let names: Vec<String> = ws
            .frame_paths()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0001.png", "0002.png", "0003.png"]);
    }

    #[test]
    fn test_frame_paths_follow_timeline_past_four_digits() {
        let dir = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        ws.create().unwrap();
        for position in [9998, 999, 10000, 1000, 9999] {
            fs::write(ws.root().join(frame_file_name(position)), b"x").unwrap();
        }

        let names: Vec<String> = ws
            .frame_paths()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["1000.png", "1001.png", "9999.png", "10000.png", "10001.png"]
        );
    }

    #[test]
    fn test_frame_paths_non_numeric_names_sort_first() {
        let dir = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        ws.create().unwrap();
        for name in ["0002.png", "cover.png", "0010.png"] {
            fs::write(ws.root().join(name), b"x").unwrap();
        }

        let names: Vec<String> = ws
            .frame_paths()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["cover.png", "0002.png", "0010.png"]);
    }

    #[test]
    fn test_frame_paths_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        assert!(ws.frame_paths().is_err());
    }

    #[test]
    fn test_move_temp_replaces_output() {
        let dir = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        ws.create().unwrap();
        fs::write(ws.temp_output_path(), b"new").unwrap();
        let output = dir.path().join("out").join("result.mp4");
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, b"old").unwrap();

        ws.move_temp(&output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"new");
        assert!(!ws.temp_output_path().exists());
    }

    #[test]
    fn test_clean_removes_workspace_and_empty_parent() {
        let dir = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        ws.create().unwrap();
        fs::write(ws.root().join("0001.png"), b"x").unwrap();

        ws.clean(false).unwrap();
        assert!(!ws.root().exists());
        assert!(!dir.path().join(TEMP_DIRECTORY).exists());
    }

    #[test]
    fn test_clean_keeps_frames_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        ws.create().unwrap();
        fs::write(ws.root().join("0001.png"), b"x").unwrap();

        ws.clean(true).unwrap();
        assert!(ws.root().join("0001.png").exists());
    }

    #[test]
    fn test_clean_keeps_parent_shared_with_other_targets() {
        let dir = tempfile::tempdir().unwrap();
        let a = TempWorkspace::for_target(&dir.path().join("a.mp4"));
        let b = TempWorkspace::for_target(&dir.path().join("b.mp4"));
        a.create().unwrap();
        b.create().unwrap();

        a.clean(false).unwrap();
        assert!(!a.root().exists());
        assert!(b.root().exists());
    }

    #[test]
    fn test_clean_without_workspace_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let ws = TempWorkspace::for_target(&dir.path().join("clip.mp4"));
        assert!(ws.clean(false).is_ok());
    }
}
