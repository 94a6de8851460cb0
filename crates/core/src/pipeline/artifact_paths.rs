use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Output files a session can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Annotated copy of a single input image.
    ImageResult,
    /// Annotated copy of a video file.
    VideoResult,
    /// Annotated frame saved on request during a live session.
    Snapshot,
    /// Annotated live stream.
    Recording,
}

impl ArtifactKind {
    fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::ImageResult => "result",
            ArtifactKind::VideoResult => "monitored",
            ArtifactKind::Snapshot => "snapshot",
            ArtifactKind::Recording => "recording",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ArtifactKind::ImageResult | ArtifactKind::Snapshot => "jpg",
            ArtifactKind::VideoResult | ArtifactKind::Recording => "mp4",
        }
    }
}

/// `<output_dir>/<prefix>_<YYYYmmdd_HHMMSS>.<ext>`.
pub fn artifact_path(output_dir: &Path, kind: ArtifactKind, at: NaiveDateTime) -> PathBuf {
    output_dir.join(format!(
        "{}_{}.{}",
        kind.prefix(),
        at.format(FILE_TIMESTAMP_FORMAT),
        kind.extension()
    ))
}

/// Like [`artifact_path`], but appends `_1`, `_2`, ... when a file with that
/// name already exists, so several snapshots within one second are all kept.
pub fn unique_artifact_path(output_dir: &Path, kind: ArtifactKind, at: NaiveDateTime) -> PathBuf {
    let path = artifact_path(output_dir, kind, at);
    if !path.exists() {
        return path;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (1..)
        .map(|n| output_dir.join(format!("{stem}_{n}.{}", kind.extension())))
        .find(|candidate| !candidate.exists())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 9)
            .unwrap()
    }

    #[rstest]
    #[case(ArtifactKind::ImageResult, "result_20240309_140509.jpg")]
    #[case(ArtifactKind::VideoResult, "monitored_20240309_140509.mp4")]
    #[case(ArtifactKind::Snapshot, "snapshot_20240309_140509.jpg")]
    #[case(ArtifactKind::Recording, "recording_20240309_140509.mp4")]
    fn test_artifact_names(#[case] kind: ArtifactKind, #[case] name: &str) {
        let path = artifact_path(Path::new("outputs/safety_monitoring"), kind, at());
        assert_eq!(path, Path::new("outputs/safety_monitoring").join(name));
    }

    #[test]
    fn test_unique_path_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_artifact_path(dir.path(), ArtifactKind::Snapshot, at());
        assert_eq!(first, dir.path().join("snapshot_20240309_140509.jpg"));

        std::fs::write(&first, b"x").unwrap();
        let second = unique_artifact_path(dir.path(), ArtifactKind::Snapshot, at());
        assert_eq!(second, dir.path().join("snapshot_20240309_140509_1.jpg"));

        std::fs::write(&second, b"x").unwrap();
        let third = unique_artifact_path(dir.path(), ArtifactKind::Snapshot, at());
        assert_eq!(third, dir.path().join("snapshot_20240309_140509_2.jpg"));
    }
}
