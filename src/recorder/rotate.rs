//! Archive file rotation
//!
//! On stop-recording the current file is renamed to a timestamped archive
//! name (second resolution). Two rotations within the same second get a
//! numeric suffix so no archive is ever overwritten.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Timestamp pattern used for archive filenames
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Format the archive filename stem for `when`
pub fn archive_stem(when: DateTime<Local>) -> String {
    when.format(ARCHIVE_TIMESTAMP_FORMAT).to_string()
}

/// Pick a non-existing archive path in `dir` for `when`
///
/// Same-second collisions resolve to `<stem>-1`, `<stem>-2`, and so on.
pub fn unique_archive_path(dir: &Path, when: DateTime<Local>, extension: &str) -> PathBuf {
    let stem = archive_stem(when);

    let candidate = dir.join(format!("{}.{}", stem, extension));
    if !candidate.exists() {
        return candidate;
    }

    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{}-{}.{}", stem, n, extension));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Rename `current` into `dir` under a timestamped archive name
///
/// Returns the archive path, or `None` when no current file exists on disk
/// (nothing was ever written).
pub async fn rotate_current(
    current: &Path,
    dir: &Path,
    extension: &str,
) -> io::Result<Option<PathBuf>> {
    if !current.exists() {
        return Ok(None);
    }

    let archive = unique_archive_path(dir, Local::now(), extension);
    tokio::fs::rename(current, &archive).await?;
    Ok(Some(archive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn when() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_archive_stem_format() {
        assert_eq!(archive_stem(when()), "2026-03-14_09-26-53");
    }

    #[test]
    fn test_unique_path_avoids_same_second_collision() {
        let dir = tempfile::tempdir().unwrap();

        let first = unique_archive_path(dir.path(), when(), "mjpeg");
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "2026-03-14_09-26-53.mjpeg"
        );
        std::fs::write(&first, b"x").unwrap();

        let second = unique_archive_path(dir.path(), when(), "mjpeg");
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "2026-03-14_09-26-53-1.mjpeg"
        );
        std::fs::write(&second, b"x").unwrap();

        let third = unique_archive_path(dir.path(), when(), "mjpeg");
        assert_eq!(
            third.file_name().unwrap().to_str().unwrap(),
            "2026-03-14_09-26-53-2.mjpeg"
        );
    }

    #[tokio::test]
    async fn test_rotate_missing_current_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("current.mjpeg");

        let rotated = rotate_current(&current, dir.path(), "mjpeg").await.unwrap();
        assert!(rotated.is_none());
    }

    #[tokio::test]
    async fn test_rotate_moves_contents() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("current.mjpeg");
        std::fs::write(&current, b"payload").unwrap();

        let archive = rotate_current(&current, dir.path(), "mjpeg")
            .await
            .unwrap()
            .unwrap();

        assert!(!current.exists());
        assert_eq!(std::fs::read(&archive).unwrap(), b"payload");
    }
}
