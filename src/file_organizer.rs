/// Moving files from the root directory into category subdirectories.
///
/// The [`Organizer`] is bound to one root. Constructing it creates every
/// category folder; after that it can organize a single path, sweep every
/// file currently in the root, or react to creation events coming from the
/// watcher.
use crate::file_category::{Category, CategoryTable};
use crate::output::OutputFormatter;
use crate::settle::SettlePolicy;
use crate::watcher::CreatedEvent;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors that prevent the organizer from working on its root at all.
///
/// Failures while moving a single file are not errors at this level; they are
/// reported as [`MoveOutcome::Failed`] so a sweep can carry on.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The root path does not exist or is not a directory.
    #[error("Root directory {} does not exist or is not a directory", .path.display())]
    InvalidRoot { path: PathBuf },
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Failed to list the root directory.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for organizer operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Why a path was left where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Directories are never organized.
    Directory,
    /// Name starts with `~` or `.` (lock files, partial downloads, dotfiles).
    Hidden,
    /// The path has no final component.
    NoFileName,
}

/// A file that was moved into its category folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Category,
}

/// A file that could not be moved. It stays where it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMove {
    pub source: PathBuf,
    pub file_name: String,
    pub error: String,
}

/// What happened to a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Skipped(SkipReason),
    Moved(MovedFile),
    Failed(FailedMove),
}

/// Everything a full sweep did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub moved: Vec<MovedFile>,
    pub failed: Vec<FailedMove>,
    pub skipped: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: MoveOutcome) {
        match outcome {
            MoveOutcome::Skipped(_) => self.skipped += 1,
            MoveOutcome::Moved(moved) => self.moved.push(moved),
            MoveOutcome::Failed(failed) => self.failed.push(failed),
        }
    }

    /// Returns true if no file failed to move.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Organizes the files of one root directory into category subfolders.
///
/// Destination resolution and the move itself run under an internal lock, so
/// an `Organizer` can be shared between the sweep and the watcher thread
/// without two files racing for the same free name.
#[derive(Debug)]
pub struct Organizer {
    root: PathBuf,
    table: CategoryTable,
    settle: SettlePolicy,
    move_lock: Mutex<()>,
}

impl Organizer {
    /// Binds an organizer to `root` and creates every category folder.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::InvalidRoot` if `root` is not an existing
    /// directory, or `OrganizeError::DirectoryCreationFailed` if a category
    /// folder cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use downtidy::file_category::CategoryTable;
    /// use downtidy::file_organizer::Organizer;
    ///
    /// let organizer = Organizer::new("/home/me/Downloads", CategoryTable::default())?;
    /// let report = organizer.organize_all()?;
    /// println!("moved {} files", report.moved.len());
    /// # Ok::<(), downtidy::file_organizer::OrganizeError>(())
    /// ```
    pub fn new(root: impl Into<PathBuf>, table: CategoryTable) -> OrganizeResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(OrganizeError::InvalidRoot { path: root });
        }

        let organizer = Self {
            root,
            table,
            settle: SettlePolicy::default(),
            move_lock: Mutex::new(()),
        };
        organizer.ensure_category_folders()?;
        Ok(organizer)
    }

    /// Replaces the settle policy used by [`Organizer::on_created`].
    pub fn with_settle_policy(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the folder that holds files of `category`.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    fn ensure_category_folders(&self) -> OrganizeResult<()> {
        for category in self.table.categories() {
            let category_path = self.category_dir(category);
            if category_path.is_dir() {
                continue;
            }
            // create_dir_all tolerates a concurrent creator
            fs::create_dir_all(&category_path).map_err(|e| {
                OrganizeError::DirectoryCreationFailed {
                    path: category_path.clone(),
                    source: e,
                }
            })?;
            tracing::info!("Created category folder {}", category_path.display());
        }
        Ok(())
    }

    /// Moves one file into its category folder.
    ///
    /// Directories and names starting with `~` or `.` are skipped. If the
    /// destination name is taken, `_1`, `_2`, ... is inserted before the
    /// extension until a free name is found. A failed move is reported and
    /// returned as [`MoveOutcome::Failed`]; the source stays in place.
    pub fn organize_file(&self, file_path: &Path) -> MoveOutcome {
        if file_path.is_dir() {
            tracing::debug!("Skipping directory {}", file_path.display());
            return MoveOutcome::Skipped(SkipReason::Directory);
        }

        let Some(file_name) = file_path.file_name() else {
            return MoveOutcome::Skipped(SkipReason::NoFileName);
        };
        let file_name = file_name.to_string_lossy().into_owned();

        if is_transient_name(&file_name) {
            tracing::debug!("Skipping hidden or temporary file {}", file_name);
            return MoveOutcome::Skipped(SkipReason::Hidden);
        }

        let (_, extension) = split_extension(&file_name);
        let category = self.table.classify(extension);
        let category_path = self.category_dir(category);

        let outcome = {
            let _guard = self
                .move_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let destination = resolve_destination(&category_path, &file_name);
            move_file(file_path, &destination).map(|()| destination)
        };

        match outcome {
            Ok(destination) => {
                OutputFormatter::moved(&file_name, category);
                MoveOutcome::Moved(MovedFile {
                    source: file_path.to_path_buf(),
                    destination,
                    category,
                })
            }
            Err(e) => {
                OutputFormatter::move_failed(&file_name, &e);
                tracing::debug!("Failed to move {}: {}", file_path.display(), e);
                MoveOutcome::Failed(FailedMove {
                    source: file_path.to_path_buf(),
                    file_name,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Organizes every regular file directly inside the root.
    ///
    /// Symlinks are followed when deciding what is a file; the link itself is
    /// what gets moved. Subdirectories (including the category folders) are not descended
    /// into. One file failing does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::ReadDirFailed` if the root cannot be listed.
    pub fn organize_all(&self) -> OrganizeResult<SweepReport> {
        let entries = fs::read_dir(&self.root).map_err(|e| OrganizeError::ReadDirFailed {
            path: self.root.clone(),
            source: e,
        })?;

        let mut report = SweepReport::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", self.root.display(), e);
                    continue;
                }
            };

            // Follows symlinks, so a link to a regular file is organized too
            let entry_path = entry.path();
            if entry_path.is_file() {
                report.record(self.organize_file(&entry_path));
            }
        }

        tracing::info!(
            "Sweep of {} finished: {} moved, {} failed, {} skipped",
            self.root.display(),
            report.moved.len(),
            report.failed.len(),
            report.skipped
        );
        Ok(report)
    }

    /// Handles a creation notification from the watcher.
    ///
    /// Directory creations are ignored and return `None`. For files, waits
    /// according to the settle policy and then organizes the path. Repeated
    /// notifications for the same path are harmless: a file that was already
    /// moved simply fails to be found.
    pub fn on_created(&self, event: &CreatedEvent) -> Option<MoveOutcome> {
        if event.is_dir {
            return None;
        }

        tracing::debug!("Created: {}", event.path.display());
        if !self.settle.wait(&event.path) {
            tracing::debug!("{} did not settle cleanly", event.path.display());
        }
        Some(self.organize_file(&event.path))
    }
}

/// Returns true for names that mark lock files, partial downloads and dotfiles.
pub fn is_transient_name(file_name: &str) -> bool {
    file_name.starts_with('~') || file_name.starts_with('.')
}

/// Splits a file name into stem and extension, the extension keeping its dot.
///
/// A leading dot does not start an extension.
///
/// # Examples
///
/// ```
/// use downtidy::file_organizer::split_extension;
///
/// assert_eq!(split_extension("report.pdf"), ("report", ".pdf"));
/// assert_eq!(split_extension("backup.tar.gz"), ("backup.tar", ".gz"));
/// assert_eq!(split_extension("notes"), ("notes", ""));
/// ```
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    }
}

/// Picks the first free name for `file_name` inside `folder`.
///
/// Tries `file_name` itself, then `<stem>_1<ext>`, `<stem>_2<ext>`, ...
/// Anything present at a candidate path (including a dangling symlink)
/// counts as taken, so existing files are never overwritten.
pub fn resolve_destination(folder: &Path, file_name: &str) -> PathBuf {
    let mut destination = folder.join(file_name);
    let (stem, extension) = split_extension(file_name);

    let mut counter: u64 = 1;
    while fs::symlink_metadata(&destination).is_ok() {
        destination = folder.join(format!("{}_{}{}", stem, counter, extension));
        counter += 1;
    }
    if counter > 1 {
        tracing::debug!(
            "{} was taken, using {}",
            file_name,
            destination.display()
        );
    }
    destination
}

/// Renames `source` to `destination`, copying across filesystems if needed.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                "{} is on another filesystem, copying",
                destination.display()
            );
            copy_then_remove(source, destination)
        }
        result => result,
    }
}

/// Copies `source` to `destination` and removes the source.
///
/// On any failure the destination copy is removed again, so the file ends
/// up in exactly one place: the destination on success, the source otherwise.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(source, destination) {
        discard_partial_copy(destination);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(source) {
        discard_partial_copy(destination);
        return Err(e);
    }
    Ok(())
}

fn discard_partial_copy(destination: &Path) {
    if let Err(e) = fs::remove_file(destination)
        && e.kind() != io::ErrorKind::NotFound
    {
        tracing::warn!(
            "Could not remove incomplete copy {}: {}",
            destination.display(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn organizer(temp_dir: &TempDir) -> Organizer {
        Organizer::new(temp_dir.path(), CategoryTable::default())
            .expect("Failed to create organizer")
    }

    #[test]
    fn test_new_creates_every_category_folder() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let organizer = organizer(&temp_dir);

        for category in Category::all() {
            assert!(organizer.category_dir(category).is_dir());
        }
    }

    #[test]
    fn test_new_keeps_existing_folders_and_contents() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let images = temp_dir.path().join("图片");
        fs::create_dir(&images).expect("Failed to create category directory");
        fs::write(images.join("old.png"), "old").expect("Failed to write test file");

        let _organizer = organizer(&temp_dir);
        let _again = organizer(&temp_dir);

        assert!(images.join("old.png").exists());
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope");

        let result = Organizer::new(&missing, CategoryTable::default());
        assert!(matches!(result, Err(OrganizeError::InvalidRoot { .. })));
        assert!(!missing.exists());
    }

    #[test]
    fn test_new_rejects_file_as_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("file.txt");
        fs::write(&file_path, "x").expect("Failed to write test file");

        let result = Organizer::new(&file_path, CategoryTable::default());
        assert!(matches!(result, Err(OrganizeError::InvalidRoot { .. })));
    }

    #[test]
    fn test_organize_file_moves_into_category() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let organizer = organizer(&temp_dir);
        let file_path = temp_dir.path().join("Photo.JPG");
        fs::write(&file_path, "jpeg").expect("Failed to write test file");

        let outcome = organizer.organize_file(&file_path);

        let expected = temp_dir.path().join("图片").join("Photo.JPG");
        assert_eq!(
            outcome,
            MoveOutcome::Moved(MovedFile {
                source: file_path.clone(),
                destination: expected.clone(),
                category: Category::Image,
            })
        );
        assert!(!file_path.exists());
        assert!(expected.exists());
    }

    #[test]
    fn test_organize_file_skips_hidden_and_temporary_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let organizer = organizer(&temp_dir);

        for name in [".DS_Store", "~$report.docx", ".partial.mp4", "~lock"] {
            let file_path = temp_dir.path().join(name);
            fs::write(&file_path, "x").expect("Failed to write test file");

            assert_eq!(
                organizer.organize_file(&file_path),
                MoveOutcome::Skipped(SkipReason::Hidden)
            );
            assert!(file_path.exists(), "{} should stay in place", name);
        }
    }

    #[test]
    fn test_organize_file_skips_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let organizer = organizer(&temp_dir);
        let dir_path = temp_dir.path().join("album.zip");
        fs::create_dir(&dir_path).expect("Failed to create directory");

        assert_eq!(
            organizer.organize_file(&dir_path),
            MoveOutcome::Skipped(SkipReason::Directory)
        );
        assert!(dir_path.is_dir());
    }

    #[test]
    fn test_organize_file_reports_missing_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let organizer = organizer(&temp_dir);

        let outcome = organizer.organize_file(&temp_dir.path().join("vanished.pdf"));
        match outcome {
            MoveOutcome::Failed(failed) => {
                assert_eq!(failed.file_name, "vanished.pdf");
                assert!(!failed.error.is_empty());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_destination_probes_linearly() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let folder = temp_dir.path();

        assert_eq!(
            resolve_destination(folder, "report.pdf"),
            folder.join("report.pdf")
        );

        fs::write(folder.join("report.pdf"), "1").expect("Failed to write test file");
        assert_eq!(
            resolve_destination(folder, "report.pdf"),
            folder.join("report_1.pdf")
        );

        fs::write(folder.join("report_1.pdf"), "2").expect("Failed to write test file");
        assert_eq!(
            resolve_destination(folder, "report.pdf"),
            folder.join("report_2.pdf")
        );
    }

    #[test]
    fn test_resolve_destination_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let folder = temp_dir.path();
        fs::write(folder.join("notes"), "1").expect("Failed to write test file");

        assert_eq!(resolve_destination(folder, "notes"), folder.join("notes_1"));
    }

    #[test]
    fn test_copy_then_remove_moves_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("movie.mkv");
        let destination = temp_dir.path().join("copied.mkv");
        fs::write(&source, "frames").expect("Failed to write test file");

        copy_then_remove(&source, &destination).expect("copy fallback failed");

        assert!(!source.exists());
        assert_eq!(
            fs::read_to_string(&destination).expect("Failed to read copy"),
            "frames"
        );
    }

    #[test]
    fn test_copy_then_remove_failure_leaves_nothing_at_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("gone.mkv");
        let destination = temp_dir.path().join("gone_copy.mkv");

        assert!(copy_then_remove(&source, &destination).is_err());
        assert!(fs::symlink_metadata(&destination).is_err());
        assert_eq!(
            resolve_destination(temp_dir.path(), "gone_copy.mkv"),
            destination
        );
    }

    #[test]
    fn test_discard_partial_copy_removes_leftover() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let partial = temp_dir.path().join("half.iso");
        fs::write(&partial, "trunc").expect("Failed to write test file");

        discard_partial_copy(&partial);
        discard_partial_copy(&partial);

        assert!(!partial.exists());
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.txt"), ("a", ".txt"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension("trailing."), ("trailing", "."));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
    }

    #[test]
    fn test_is_transient_name() {
        assert!(is_transient_name(".hidden"));
        assert!(is_transient_name("~tmp.docx"));
        assert!(!is_transient_name("normal.txt"));
        assert!(!is_transient_name("a~b.txt"));
    }

    #[test]
    fn test_on_created_ignores_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let organizer =
            organizer(&temp_dir).with_settle_policy(SettlePolicy::Fixed(Duration::ZERO));
        let dir_path = temp_dir.path().join("new folder");
        fs::create_dir(&dir_path).expect("Failed to create directory");

        let event = CreatedEvent {
            path: dir_path.clone(),
            is_dir: true,
        };
        assert_eq!(organizer.on_created(&event), None);
        assert!(dir_path.is_dir());
    }

    #[test]
    fn test_on_created_organizes_after_settling() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let organizer = organizer(&temp_dir)
            .with_settle_policy(SettlePolicy::Fixed(Duration::from_millis(10)));
        let file_path = temp_dir.path().join("song.flac");
        fs::write(&file_path, "flac").expect("Failed to write test file");

        let event = CreatedEvent {
            path: file_path.clone(),
            is_dir: false,
        };
        let outcome = organizer.on_created(&event);

        assert!(matches!(outcome, Some(MoveOutcome::Moved(_))));
        assert!(temp_dir.path().join("音频").join("song.flac").exists());

        // A duplicate notification for the same path fails harmlessly
        let again = organizer.on_created(&event);
        assert!(matches!(again, Some(MoveOutcome::Failed(_))));
        assert!(temp_dir.path().join("音频").join("song.flac").exists());
        assert!(!temp_dir.path().join("音频").join("song_1.flac").exists());
    }
}
