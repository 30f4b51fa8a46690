//! Waiting for a freshly created file to be fully written.
//!
//! A creation notification usually arrives while the writer still holds the
//! file open. Before moving it we either sleep for a fixed period or poll its
//! size and modification time until two consecutive readings agree.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

/// Default pause between a creation event and the move.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// How long to wait before organizing a newly created file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Sleep for a fixed duration.
    Fixed(Duration),
    /// Poll size and mtime every `interval` until unchanged, giving up
    /// after `max_wait`.
    Stable {
        interval: Duration,
        max_wait: Duration,
    },
}

impl Default for SettlePolicy {
    fn default() -> Self {
        SettlePolicy::Fixed(DEFAULT_SETTLE_DELAY)
    }
}

impl SettlePolicy {
    /// Blocks the calling thread until `path` is considered settled.
    ///
    /// Returns `false` when the file disappeared or never stopped changing
    /// within `max_wait`. The fixed policy always returns `true`.
    pub fn wait(&self, path: &Path) -> bool {
        match *self {
            SettlePolicy::Fixed(delay) => {
                thread::sleep(delay);
                true
            }
            SettlePolicy::Stable { interval, max_wait } => {
                wait_until_stable(path, interval, max_wait)
            }
        }
    }
}

type Snapshot = (u64, Option<SystemTime>);

fn snapshot(path: &Path) -> Option<Snapshot> {
    let metadata = fs::metadata(path).ok()?;
    Some((metadata.len(), metadata.modified().ok()))
}

fn wait_until_stable(path: &Path, interval: Duration, max_wait: Duration) -> bool {
    let deadline = Instant::now() + max_wait;
    let mut previous = snapshot(path);

    loop {
        thread::sleep(interval);

        let current = snapshot(path);
        if current.is_none() {
            tracing::debug!("{} vanished while settling", path.display());
            return false;
        }
        if current == previous {
            return true;
        }
        if Instant::now() >= deadline {
            tracing::warn!(
                "{} still changing after {:?}, organizing anyway",
                path.display(),
                max_wait
            );
            return false;
        }
        previous = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_one_second_fixed() {
        assert_eq!(
            SettlePolicy::default(),
            SettlePolicy::Fixed(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_fixed_sleeps_at_least_the_delay() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let start = Instant::now();
        let settled = SettlePolicy::Fixed(Duration::from_millis(30)).wait(temp_dir.path());
        assert!(settled);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_stable_returns_for_untouched_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("done.zip");
        fs::write(&file_path, b"complete").expect("Failed to write test file");

        let policy = SettlePolicy::Stable {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_secs(5),
        };
        assert!(policy.wait(&file_path));
    }

    #[test]
    fn test_stable_reports_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let policy = SettlePolicy::Stable {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_secs(5),
        };
        assert!(!policy.wait(&temp_dir.path().join("gone.bin")));
    }

    #[test]
    fn test_stable_waits_for_growing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("growing.iso");
        let mut file = fs::File::create(&file_path).expect("Failed to create test file");

        let writer = thread::spawn(move || {
            for _ in 0..5 {
                file.write_all(&[0u8; 1024]).expect("Failed to append");
                file.flush().expect("Failed to flush");
                thread::sleep(Duration::from_millis(20));
            }
        });

        let policy = SettlePolicy::Stable {
            interval: Duration::from_millis(60),
            max_wait: Duration::from_secs(5),
        };
        assert!(policy.wait(&file_path));
        writer.join().expect("writer panicked");
    }
}
