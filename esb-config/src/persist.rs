//! Locked, atomic writes for config files.
//!
//! Writers serialize on an exclusive lock of a sidecar `.lock` file and replace the
//! target with a rename. Concurrent invocations are not linearized: the last writer wins.

use esb_core::error::{EsbError, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

const RETRY_DELAY: Duration = Duration::from_millis(10);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

pub fn write_locked(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let lock_path = sidecar(path, ".lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)?;

    let lock_start = Instant::now();
    loop {
        match lock_file.try_lock_exclusive() {
            Ok(()) => break,
            Err(e) => {
                if lock_start.elapsed() > LOCK_TIMEOUT {
                    return Err(EsbError::Timeout(format!(
                        "waiting for lock on {}: {}",
                        lock_path.display(),
                        e
                    )));
                }
                std::thread::sleep(RETRY_DELAY);
            }
        }
    }

    let _guard = scopeguard::guard((), |_| {
        let _ = lock_file.unlock();
    });

    let temp_path = sidecar(path, &format!(".tmp.{}", std::process::id()));
    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents_and_replaces() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a/b/config.yaml");

        write_locked(&path, "version: 1\n").unwrap();
        write_locked(&path, "version: 2\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "version: 2\n");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_concurrent_writers_leave_a_complete_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let path = path.clone();
                std::thread::spawn(move || write_locked(&path, &format!("writer: {}\n", i)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("writer: "));
        assert_eq!(contents.lines().count(), 1);
    }
}
