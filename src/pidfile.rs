//! # Advisory PID record.
//!
//! The PID file only exists for external process management (`kill -HUP
//! $(cat ...)`); the supervisor never reads it back for its own logic.
//! Removal is ownership-checked: the file is deleted on clean shutdown only
//! if its content still matches the current PID, so a file already
//! overwritten by a newer supervisor instance is left alone.

use std::path::Path;
use std::{fs, process};

use tracing::warn;

/// Writes the current process id to `path`.
///
/// Failure is logged, not fatal: the file is advisory.
pub fn write(path: &Path) {
    let pid = process::id().to_string();
    if let Err(e) = fs::write(path, pid) {
        warn!(path = %path.display(), error = %e, "write pid file failed");
    }
}

/// Removes the PID file if it still belongs to this process.
///
/// The file is kept when it cannot be read or its content names a different
/// PID (a newer instance took over the path).
pub fn remove(path: &Path) {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "read pid file failed");
            return;
        }
    };
    if content.trim() != process::id().to_string() {
        warn!(path = %path.display(), "pid file owned by another process, keeping it");
        return;
    }
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "remove pid file failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_remove_owned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("molt.pid");

        write(&path);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, process::id().to_string());

        remove(&path);
        assert!(!path.exists());
    }

    #[test]
    fn test_foreign_pid_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("molt.pid");
        fs::write(&path, "1").unwrap();

        remove(&path);
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "1");
    }

    #[test]
    fn test_remove_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        remove(&dir.path().join("absent.pid"));
    }
}
